//! Path-keyword rate limit policies.
//!
//! # Responsibilities
//! - Hold the ordered keyword → policy table
//! - Resolve the policy governing a request path
//!
//! # Design Decisions
//! - Ordered list, not a map: when several keywords occur in one path the
//!   earliest entry wins, every time
//! - Immutable after construction (shared without locks)
//! - Exactly one default policy, returned when no keyword matches

use serde::{Deserialize, Serialize};

/// Requests allowed per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Policy {
    /// Maximum requests admitted in one window.
    pub limit: u64,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl Policy {
    /// Fallback policy for paths without a dedicated entry.
    pub const DEFAULT: Policy = Policy::new(30, 30_000);

    pub const fn new(limit: u64, window_ms: u64) -> Self {
        Self { limit, window_ms }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A policy bound to a path keyword, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathPolicy {
    /// Substring matched against the request path.
    pub keyword: String,

    pub limit: u64,

    pub window_ms: u64,
}

impl PathPolicy {
    pub fn new(keyword: impl Into<String>, limit: u64, window_ms: u64) -> Self {
        Self {
            keyword: keyword.into(),
            limit,
            window_ms,
        }
    }

    pub fn policy(&self) -> Policy {
        Policy::new(self.limit, self.window_ms)
    }
}

/// Production endpoint table. Order is significant.
pub fn default_path_policies() -> Vec<PathPolicy> {
    vec![
        // Admin tooling polls frequently
        PathPolicy::new("admin", 60, 60_000),
        // Minting
        PathPolicy::new("purchaseNFT", 10, 60_000),
        PathPolicy::new("completeMinting", 10, 60_000),
        // Staking
        PathPolicy::new("prepareStaking", 20, 30_000),
        PathPolicy::new("completeStaking", 20, 30_000),
        // Rewards
        PathPolicy::new("claimRewards", 5, 60_000),
        PathPolicy::new("recordTweetReward", 15, 60_000),
    ]
}

/// Ordered keyword lookup with a default fallback.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: Vec<(String, Policy)>,
    default: Policy,
}

impl PolicyTable {
    /// Build a table; `entries` keep their order for first-match-wins lookup.
    pub fn new(entries: Vec<PathPolicy>, default: Policy) -> Self {
        let entries = entries
            .into_iter()
            .map(|p| {
                let policy = p.policy();
                (p.keyword, policy)
            })
            .collect();

        Self { entries, default }
    }

    /// Resolve the policy for a request path.
    ///
    /// Returns the first entry whose keyword is contained in `path`, or the
    /// default policy.
    pub fn lookup(&self, path: &str) -> Policy {
        self.keyword_policy(path).unwrap_or(self.default)
    }

    /// The keyword policy governing `path`, if any entry matches.
    pub fn keyword_policy(&self, path: &str) -> Option<Policy> {
        self.entries
            .iter()
            .find(|(keyword, _)| path.contains(keyword.as_str()))
            .map(|(_, policy)| *policy)
    }

    pub fn default_policy(&self) -> Policy {
        self.default
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new(default_path_policies(), Policy::DEFAULT)
    }
}
