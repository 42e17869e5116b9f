//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_requests_total` (counter): requests by outcome (forwarded, rejected)
//! - `guard_rejections_total` (counter): rejections by reason
//! - `guard_counter_store_entries` (gauge): live client records
//! - `guard_evicted_total` (counter): records removed by the sweeper

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_forwarded() {
    ::metrics::counter!("guard_requests_total", "outcome" => "forwarded").increment(1);
}

pub fn record_rejection(reason: &'static str) {
    ::metrics::counter!("guard_requests_total", "outcome" => "rejected").increment(1);
    ::metrics::counter!("guard_rejections_total", "reason" => reason).increment(1);
}

pub fn record_sweep(evicted: usize, remaining: usize) {
    ::metrics::counter!("guard_evicted_total").increment(evicted as u64);
    ::metrics::gauge!("guard_counter_store_entries").set(remaining as f64);
}
