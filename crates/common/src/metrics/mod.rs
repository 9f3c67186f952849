//! Metrics and observability utilities
//!
//! Prometheus-style metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PaperLane metrics
pub const METRICS_PREFIX: &str = "paperlane";

/// Buckets for outbound backend latency (remote search and generation)
pub const BACKEND_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_backend_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Calls made to external backends, by backend and outcome"
    );

    describe_histogram!(
        format!("{}_backend_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "External backend latency in seconds"
    );

    describe_counter!(
        format!("{}_route_selections_total", METRICS_PREFIX),
        Unit::Count,
        "Router decisions, by selected backend"
    );

    describe_histogram!(
        format!("{}_retrieved_documents", METRICS_PREFIX),
        Unit::Count,
        "Documents retrieved from the vector store per RAG query"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record one call to an external backend
pub fn record_backend_call(backend: &str, duration_secs: f64, success: bool) {
    let outcome = if success { "success" } else { "error" };

    counter!(
        format!("{}_backend_calls_total", METRICS_PREFIX),
        "backend" => backend.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        format!("{}_backend_duration_seconds", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .record(duration_secs);
}

/// Helper to record a router decision
pub fn record_route(backend: &str) {
    counter!(
        format!("{}_route_selections_total", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .increment(1);
}

/// Helper to record how many documents a retrieval produced
pub fn record_retrieval(document_count: usize) {
    histogram!(format!("{}_retrieved_documents", METRICS_PREFIX)).record(document_count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in BACKEND_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: calls must be no-ops
        let metrics = RequestMetrics::start("POST", "/search-papers");
        metrics.finish(200);
        record_backend_call("arxiv", 0.12, true);
        record_route("passthrough");
        record_retrieval(0);
    }
}
