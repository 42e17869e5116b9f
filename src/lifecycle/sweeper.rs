//! Periodic eviction of expired client records.
//!
//! # Responsibilities
//! - Bound counter store memory by dropping closed windows
//! - Run on its own timer, independent of request traffic
//!
//! # Design Decisions
//! - Eviction is shard-by-shard (`DashMap::retain`), never a whole-map lock
//! - `sweep_at` is the single eviction step; `run` only schedules it

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::observability::metrics;
use crate::security::{now_millis, CounterStore};

pub struct Sweeper {
    store: Arc<CounterStore>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(store: Arc<CounterStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Evict records expired at `now` (Unix millis). Returns the number removed.
    pub fn sweep_at(&self, now: u64) -> usize {
        let evicted = self.store.evict_expired(now);
        let remaining = self.store.len();
        metrics::record_sweep(evicted, remaining);

        if evicted > 0 {
            tracing::debug!(evicted, remaining, "Evicted expired rate limit records");
        }
        evicted
    }

    /// Sweep every interval until shutdown is signalled.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Counter sweeper starting");

        // First sweep one interval from now, not immediately
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_at(now_millis());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Counter sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
