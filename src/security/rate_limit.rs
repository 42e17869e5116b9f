//! Fixed-window rate limiting with path-specific policies.
//!
//! # Responsibilities
//! - Resolve the policy for the request path
//! - Count the request against the client's window (overall and per path key)
//! - Decide admission and produce quota headers or a retry hint
//!
//! # Design Decisions
//! - One window per client; the request that opens it picks its length
//! - The resolved limit bounds the client's whole window, so traffic to other
//!   paths counts against a strict endpoint too
//! - A rejection is attributed to the endpoint when its own keyword quota is
//!   exhausted, otherwise to the client-wide window
//! - Rejection is an ordinary outcome, not an error

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;

use crate::security::policy::PolicyTable;
use crate::security::store::CounterStore;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Which quota a rejected request exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaScope {
    /// All requests from the client in this window.
    Overall,
    /// Requests from the client to one path key in this window.
    Path,
}

impl QuotaScope {
    pub fn message(&self) -> &'static str {
        match self {
            QuotaScope::Overall => "Too many requests. Please try again later.",
            QuotaScope::Path => "Too many requests to this endpoint. Please try again later.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaScope::Overall => "quota_overall",
            QuotaScope::Path => "quota_path",
        }
    }
}

/// Quota information attached to admitted responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaHeaders {
    pub limit: u64,
    pub remaining: u64,
    /// Window expiry in Unix seconds.
    pub reset_secs: u64,
}

impl QuotaHeaders {
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(self.reset_secs));
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed(QuotaHeaders),
    Rejected {
        scope: QuotaScope,
        retry_after_secs: u64,
    },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed(_))
    }
}

/// Group a path by its first two segments, e.g. `/api/claimRewards/x` → `api/claimRewards`.
pub fn path_key(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').skip(1).take(2).collect::<Vec<_>>().join("/")
}

/// Per-client fixed-window limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    policies: Arc<PolicyTable>,
    store: Arc<CounterStore>,
}

impl RateLimiter {
    pub fn new(policies: PolicyTable, store: Arc<CounterStore>) -> Self {
        Self {
            policies: Arc::new(policies),
            store,
        }
    }

    pub fn store(&self) -> &Arc<CounterStore> {
        &self.store
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// Count a request from `identifier` to `path` at `now` (Unix millis) and
    /// decide whether it may proceed.
    pub fn admit(&self, identifier: &str, path: &str, now: u64) -> Admission {
        let keyword_policy = self.policies.keyword_policy(path);
        let policy = keyword_policy.unwrap_or(self.policies.default_policy());
        let key = path_key(path);

        let (count, path_count, retry_after_secs, reset_secs) = {
            let mut record = self.store.get_or_create(identifier, now, policy.window_ms);
            if record.is_expired(now) {
                record.roll_over(now, policy.window_ms);
            }
            let (count, path_count) = record.record_hit(&key);
            (
                count,
                path_count,
                record.retry_after_secs(now),
                record.reset_secs(),
            )
        };

        // path_count never exceeds count, so this one check covers both quotas
        if count > policy.limit {
            let scope = if keyword_policy.is_some() && path_count > policy.limit {
                QuotaScope::Path
            } else {
                QuotaScope::Overall
            };
            return Admission::Rejected {
                scope,
                retry_after_secs,
            };
        }

        Admission::Allowed(QuotaHeaders {
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(count),
            reset_secs,
        })
    }
}
