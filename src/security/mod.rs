//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming API request:
//!     → headers.rs (defensive headers on whatever response leaves)
//!     → csrf.rs (origin check for mutating methods)
//!     → rate_limit.rs (policy.rs lookup, store.rs counters)
//!     → validator.rs (per-route predicates, optional)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: a mutating request without a trusted origin never passes
//! - Counters live only in process memory
//! - No trust in client input beyond the configured forwarding headers

pub mod csrf;
pub mod headers;
pub mod policy;
pub mod rate_limit;
pub mod store;
pub mod validator;

pub use csrf::CsrfGuard;
pub use headers::SecurityHeaders;
pub use policy::{PathPolicy, Policy, PolicyTable};
pub use rate_limit::{Admission, QuotaScope, RateLimiter};
pub use store::{CounterRecord, CounterStore};
pub use validator::{validate_request, RequestPredicate, Validation};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
