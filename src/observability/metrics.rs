//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fakeapi_requests_total` (counter): requests by method and status
//! - `fakeapi_request_duration_seconds` (histogram): latency distribution
//! - `fakeapi_routes_registered` (gauge): endpoints in the live router
//!
//! # Design Decisions
//! - The `metrics` facade is a no-op until a recorder is installed, so
//!   recording is always safe to call
//! - Prometheus exporter only when `observability.metrics_enabled`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one answered request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "fakeapi_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "fakeapi_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record how many endpoints the live router serves.
pub fn record_routes(count: usize) {
    gauge!("fakeapi_routes_registered").set(count as f64);
}
