//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in a `tracing` span, records Prometheus metrics and
//! logs completion.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::with_metrics;

/// Route label used for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Route template for metrics and spans.
///
/// Uses the matched route rather than the raw path so that unknown paths
/// cannot blow up Prometheus label cardinality.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Observability middleware for Axum.
///
/// This middleware wraps every request with:
/// 1. A `tracing` span carrying method, target and route
/// 2. Prometheus metrics recording
/// 3. Request/response logging
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %route,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    with_metrics(|m| {
        m.record_http_request(method.as_str(), &route, status.as_u16(), duration.as_secs_f64())
    });

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}
