//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs / server.rs):
//!     Load config → Validate → Build guard chain → Start sweeper → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Stop sweeper
//!     → Clear counter store → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Background tasks subscribe to one broadcast shutdown channel
//! - The sweeper can also be driven by hand for deterministic tests

pub mod shutdown;
pub mod signals;
pub mod sweeper;

pub use shutdown::Shutdown;
pub use sweeper::Sweeper;
