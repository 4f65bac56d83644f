//! Prometheus Metrics Definitions
//!
//! Defines all guestbook metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Store operation latency buckets (seconds)
const STORE_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<GuestbookMetrics>> = Lazy::new(GuestbookMetrics::new);

/// Container for all guestbook metrics.
#[derive(Clone)]
pub struct GuestbookMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Store operation counter - labels: backend, operation, status
    pub store_operations_total: CounterVec,

    /// Store operation duration histogram - labels: backend, operation
    pub store_operation_duration_seconds: HistogramVec,

    /// Visitor create counter - labels: outcome (hello, added, returning)
    pub visitor_creates_total: CounterVec,

    /// Cache failures that were bypassed - labels: stage (acquire, lookup, mark)
    pub cache_fail_open_total: CounterVec,
}

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

impl GuestbookMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "guestbook_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "guestbook_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            store_operations_total: register_counter_vec!(
                "guestbook_store_operations_total",
                "Total number of visitor store operations",
                &["backend", "operation", "status"]
            )
            .map_err(|e| registration_error("store_operations_total", e))?,

            store_operation_duration_seconds: register_histogram_vec!(
                "guestbook_store_operation_duration_seconds",
                "Visitor store operation duration in seconds",
                &["backend", "operation"],
                STORE_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("store_operation_duration_seconds", e))?,

            visitor_creates_total: register_counter_vec!(
                "guestbook_visitor_creates_total",
                "Visitor create requests by outcome",
                &["outcome"]
            )
            .map_err(|e| registration_error("visitor_creates_total", e))?,

            cache_fail_open_total: register_counter_vec!(
                "guestbook_cache_fail_open_total",
                "Presence cache failures bypassed on the create path",
                &["stage"]
            )
            .map_err(|e| registration_error("cache_fail_open_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a visitor store operation.
    pub fn record_store_operation(
        &self,
        backend: &str,
        operation: &str,
        success: bool,
        duration_secs: f64,
    ) {
        let status = if success { "success" } else { "error" };
        self.store_operations_total
            .with_label_values(&[backend, operation, status])
            .inc();
        self.store_operation_duration_seconds
            .with_label_values(&[backend, operation])
            .observe(duration_secs);
    }

    /// Record the outcome of a create request.
    pub fn record_visitor_create(&self, outcome: &str) {
        self.visitor_creates_total.with_label_values(&[outcome]).inc();
    }

    /// Record a cache failure that the create path bypassed.
    pub fn record_cache_fail_open(&self, stage: &str) {
        self.cache_fail_open_total.with_label_values(&[stage]).inc();
    }
}

/// Run `f` against the global metrics if they initialized.
pub fn with_metrics(f: impl FnOnce(&GuestbookMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Register the guestbook collectors before the first scrape.
    Lazy::force(&METRICS);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_http_request() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        metrics.record_http_request("GET", "/visitors", 200, 0.015);
        let count = metrics
            .http_requests_total
            .with_label_values(&["GET", "/visitors", "200"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_record_store_operation() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        metrics.record_store_operation("memory", "persist", true, 0.005);
        metrics.record_store_operation("memory", "list", false, 0.010);
        let errors = metrics
            .store_operations_total
            .with_label_values(&["memory", "list", "error"])
            .get();
        assert!(errors >= 1.0);
        Ok(())
    }

    #[test]
    fn test_visitor_create_outcomes() -> Result<(), String> {
        let metrics = METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))?;
        let before = metrics
            .visitor_creates_total
            .with_label_values(&["returning"])
            .get();
        with_metrics(|m| m.record_visitor_create("returning"));
        let after = metrics
            .visitor_creates_total
            .with_label_values(&["returning"])
            .get();
        assert!(after >= before + 1.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_metrics_handler_exposes_guestbook_metrics() {
        with_metrics(|m| m.record_cache_fail_open("acquire"));
        let response = metrics_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
