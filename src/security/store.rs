//! In-memory per-client counter storage.
//!
//! # Responsibilities
//! - Lazily create one window record per client identifier
//! - Hand out exclusive access for read-modify-write updates
//! - Evict records whose window has fully expired
//!
//! # Design Decisions
//! - `DashMap` shards the lock; a returned `RefMut` holds the shard write
//!   lock, so an update through it cannot interleave with another request
//!   for the same identifier
//! - Eviction walks shard by shard and never blocks the whole map
//! - Request handling never evicts; only the sweeper does

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::collections::HashMap;

/// Fixed-window counters for one client identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterRecord {
    /// Requests seen in the current window, all paths combined.
    pub count: u64,

    /// Window expiry, milliseconds since the Unix epoch.
    pub reset_time: u64,

    /// Requests per path key within the current window.
    pub path_counts: HashMap<String, u64>,
}

impl CounterRecord {
    pub fn new(reset_time: u64) -> Self {
        Self {
            count: 0,
            reset_time,
            path_counts: HashMap::new(),
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now > self.reset_time
    }

    /// Start a fresh window. Both counters are cleared together.
    pub fn roll_over(&mut self, now: u64, window_ms: u64) {
        self.count = 0;
        self.path_counts.clear();
        self.reset_time = now.saturating_add(window_ms);
    }

    /// Count one request against `path_key`.
    ///
    /// Returns `(overall_count, path_count)` after the increment.
    pub fn record_hit(&mut self, path_key: &str) -> (u64, u64) {
        self.count = self.count.saturating_add(1);

        let path_count = match self.path_counts.get_mut(path_key) {
            Some(c) => {
                *c = c.saturating_add(1);
                *c
            }
            None => {
                self.path_counts.insert(path_key.to_string(), 1);
                1
            }
        };

        (self.count, path_count)
    }

    /// Whole seconds until the window closes, rounded up.
    pub fn retry_after_secs(&self, now: u64) -> u64 {
        self.reset_time.saturating_sub(now).div_ceil(1000)
    }

    /// Window expiry as Unix seconds, rounded up.
    pub fn reset_secs(&self) -> u64 {
        self.reset_time.div_ceil(1000)
    }
}

/// Concurrent map of identifier → counter record.
#[derive(Debug, Default)]
pub struct CounterStore {
    records: DashMap<String, CounterRecord>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Get the record for `identifier`, creating it with a window ending at
    /// `now + window_ms` if absent.
    ///
    /// The returned guard holds the shard lock. Keep it short-lived and do not
    /// touch the store again while it is alive.
    pub fn get_or_create(
        &self,
        identifier: &str,
        now: u64,
        window_ms: u64,
    ) -> RefMut<'_, String, CounterRecord> {
        if let Some(record) = self.records.get_mut(identifier) {
            return record;
        }

        // Lost a race with another creator? `or_insert_with` keeps theirs.
        self.records
            .entry(identifier.to_string())
            .or_insert_with(|| CounterRecord::new(now.saturating_add(window_ms)))
    }

    /// Snapshot of a record, if present.
    pub fn get(&self, identifier: &str) -> Option<CounterRecord> {
        self.records.get(identifier).map(|r| r.value().clone())
    }

    /// Remove every record whose window ended before `now`.
    ///
    /// Returns the number of evicted records.
    pub fn evict_expired(&self, now: u64) -> usize {
        let mut evicted = 0;
        self.records.retain(|_, record| {
            let keep = !record.is_expired(now);
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all state. Called once the server has stopped serving.
    pub fn shutdown(&self) {
        let remaining = self.records.len();
        self.records.clear();
        tracing::debug!(records = remaining, "Counter store cleared");
    }
}
