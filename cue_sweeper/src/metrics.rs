//! Prometheus metrics for the expiry sweeper.
//!
//! Without an installed exporter the recording functions are no-ops, so the
//! sweeper runs the same whether or not `METRICS_BIND` is set.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Increment the completed sweep counter.
pub fn sweep_runs_total() {
    metrics::counter!("sweep_runs_total").increment(1);
}

/// Add matches moved to Expired by one sweep.
pub fn matches_expired_total(count: u64) {
    metrics::counter!("matches_expired_total").increment(count);
}

/// Add failures seen by one sweep.
pub fn sweep_errors_total(count: u64) {
    metrics::counter!("sweep_errors_total").increment(count);
}

/// Record how long one sweep took.
pub fn sweep_duration_ms(duration_ms: f64) {
    metrics::histogram!("sweep_duration_ms").record(duration_ms);
}
