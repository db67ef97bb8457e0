//! Metrics collection and exposition.
//!
//! # Metrics
//! - `app_host_dispatch_total` (counter): dispatches by outcome
//! - `app_host_routing_table_builds_total` (counter): table builds by method
//! - `app_host_startup_runs_total` (counter): startup attempts by result
//! - `app_host_static_bytes_total` (counter): bytes streamed from static files

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);

    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

/// Record the outcome of one dispatch.
pub fn record_dispatch(outcome: &'static str) {
    counter!("app_host_dispatch_total", "outcome" => outcome).increment(1);
}

/// Record a routing table build.
pub fn record_table_build(method: &str) {
    counter!("app_host_routing_table_builds_total", "method" => method.to_string()).increment(1);
}

/// Record one attempt of the startup routine.
pub fn record_startup_run(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("app_host_startup_runs_total", "result" => result).increment(1);
}

/// Record bytes copied from a static file.
pub fn record_static_bytes(bytes: u64) {
    counter!("app_host_static_bytes_total").increment(bytes);
}
