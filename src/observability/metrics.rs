//! Metrics collection and exposition.
//!
//! # Metrics
//! - `worker_jobs_total` (counter): jobs by operation and outcome
//! - `worker_job_duration_seconds` (histogram): time to first byte of output
//! - `worker_backend_requests_total` (counter): backend calls by operation, status
//! - `worker_backend_request_duration_seconds` (histogram): backend latency
//! - `worker_backend_retries_total` (counter): retries by operation, reason
//! - `worker_backend_ready` (gauge): 1 once the readiness gate has passed
//!
//! Updates are no-ops until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::routing::Operation;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished job. `operation` is the resolved api_name or a
/// placeholder for rejected jobs.
pub fn record_job(operation: &'static str, outcome: &'static str, start: Instant) {
    counter!("worker_jobs_total", "operation" => operation, "outcome" => outcome).increment(1);
    histogram!("worker_job_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_call(operation: Operation, status: u16, start: Instant) {
    counter!(
        "worker_backend_requests_total",
        "operation" => operation.api_name(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("worker_backend_request_duration_seconds", "operation" => operation.api_name())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_retry(operation: Operation, reason: &'static str) {
    counter!(
        "worker_backend_retries_total",
        "operation" => operation.api_name(),
        "reason" => reason
    )
    .increment(1);
}

pub fn record_backend_ready(ready: bool) {
    gauge!("worker_backend_ready").set(if ready { 1.0 } else { 0.0 });
}
