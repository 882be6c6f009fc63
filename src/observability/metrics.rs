//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_upstream_requests_total` (counter): outbound calls by backend, outcome
//! - `gateway_upstream_duration_seconds` (histogram): outbound latency by backend
//! - `gateway_circuit_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `gateway_retry_jobs_total` (counter): deferred jobs by event
//! - `gateway_degraded_enrichments_total` (counter): stubbed enrichment fields
//!
//! Recording goes through the `metrics` facade, so it is a no-op until
//! `init_metrics` installs the Prometheus exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one outbound call and its latency.
pub fn record_upstream_call(backend: &str, outcome: &'static str, started: Instant) {
    counter!(
        "gateway_upstream_requests_total",
        "backend" => backend.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("gateway_upstream_duration_seconds", "backend" => backend.to_string())
        .record(started.elapsed().as_secs_f64());
}

/// Publish the current breaker state of a backend.
pub fn record_circuit_state(backend: &str, state: u8) {
    gauge!("gateway_circuit_state", "backend" => backend.to_string()).set(f64::from(state));
}

/// Count a retry scheduler event (`submitted`, `succeeded`, `failed`).
pub fn record_retry_job(event: &'static str) {
    counter!("gateway_retry_jobs_total", "event" => event).increment(1);
}

/// Count an enrichment field that was replaced by a stub.
pub fn record_degraded_enrichment(backend: &str) {
    counter!("gateway_degraded_enrichments_total", "backend" => backend.to_string()).increment(1);
}
