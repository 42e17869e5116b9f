//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Guard chain and background tasks produce:
//!     → logging.rs (structured log events, per-request completion lines)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (tracing fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields, never interpolated strings, for request data
//! - Metric updates are cheap no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
