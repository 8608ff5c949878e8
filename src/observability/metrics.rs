//! Metrics collection and exposition.
//!
//! # Metrics
//! - `flowhost_requests_total` (counter): requests by context path, status
//! - `flowhost_request_duration_seconds` (histogram): latency distribution
//! - `flowhost_extension_loads_total` (counter): dynamic load waves
//! - `flowhost_extension_archives_total` (counter): archives mounted
//! - `flowhost_tls_reloads_total` (counter): reload outcomes
//! - `flowhost_rate_limited_total` (counter): rejected requests by class

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a dispatched request against its mounted context.
pub fn record_request(context_path: &str, status: StatusCode, start: Instant) {
    metrics::counter!(
        "flowhost_requests_total",
        "context" => context_path.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("flowhost_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

/// Record a completed dynamic extension load wave.
pub fn record_extension_load(mounted_archives: usize) {
    metrics::counter!("flowhost_extension_loads_total").increment(1);
    metrics::counter!("flowhost_extension_archives_total").increment(mounted_archives as u64);
}

/// Record a TLS material reload attempt.
pub fn record_tls_reload(success: bool) {
    metrics::counter!(
        "flowhost_tls_reloads_total",
        "outcome" => if success { "reloaded" } else { "kept_previous" }
    )
    .increment(1);
}

/// Record a rate-limited request.
pub fn record_rate_limited(class: &'static str) {
    metrics::counter!("flowhost_rate_limited_total", "class" => class).increment(1);
}
