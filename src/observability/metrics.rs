//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): finished requests by outcome
//! - `proxy_cache_hits_total` / `proxy_cache_misses_total` (counters)
//! - `proxy_cache_evictions_total` (counter)
//! - `proxy_cache_bytes` (gauge): current cache footprint

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a finished request by outcome.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("proxy_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_hit() {
    metrics::counter!("proxy_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    metrics::counter!("proxy_cache_misses_total").increment(1);
}

pub fn record_cache_eviction() {
    metrics::counter!("proxy_cache_evictions_total").increment(1);
}

/// Record the cache's total footprint after an insert.
pub fn record_cache_footprint(bytes: usize) {
    metrics::gauge!("proxy_cache_bytes").set(bytes as f64);
}
