//! REST API Routes Module
//!
//! Includes:
//! - Visitor routes at /visitors, mirrored under /api
//! - Health check endpoints (Kubernetes-compatible)
//! - Prometheus metrics and the OpenAPI document
//! - CORS support for browser-based clients

pub mod health;
pub mod visitors;

use std::time::Duration;

use axum::{
    http::{header, request::Parts, HeaderValue, Method},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::constants::API_PREFIX;
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use health::create_router as health_router;
pub use visitors::create_router as visitors_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only origins accepted by
/// [`ApiConfig::is_origin_allowed`] are allowed, including `*.domain`
/// wildcard entries.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if !config.is_production() {
        tracing::info!("CORS: Development mode - allowing all origins");
        return cors.allow_origin(Any);
    }

    tracing::info!(
        "CORS: Production mode - allowing origins: {:?}",
        config.cors_origins
    );
    let matcher = ApiConfig {
        cors_origins: config.cors_origins.clone(),
        ..Default::default()
    };
    let cors = cors.allow_origin(AllowOrigin::predicate(
        move |origin: &HeaderValue, _parts: &Parts| {
            origin
                .to_str()
                .map(|o| matcher.is_origin_allowed(o))
                .unwrap_or(false)
        },
    ));

    if config.cors_allow_credentials {
        cors.allow_credentials(true)
    } else {
        cors
    }
}

/// Create the complete API router.
///
/// - Visitor routes at /visitors and /api/visitors (with or without a
///   trailing slash)
/// - Health checks at /health/*
/// - Metrics at /metrics
/// - OpenAPI spec at /openapi.json
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> Router {
    let router = Router::new()
        .merge(visitors::create_router())
        .nest(API_PREFIX, visitors::create_router())
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .with_state(state);

    let cors = build_cors_layer(api_config);

    router
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::services::VisitorService;

    fn app() -> Router {
        create_api_router(
            AppState::new(VisitorService::new(None, None)),
            &ApiConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_core_routes_are_mounted() {
        for path in [
            "/visitors",
            "/visitors/",
            "/api/visitors",
            "/api/visitors/",
            "/health/ping",
            "/health/live",
            "/health/ready",
            "/metrics",
            "/openapi.json",
        ] {
            let response = app()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "GET {}", path);
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app()
            .oneshot(Request::get("/visitor").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_dev_mode() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/visitors")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
