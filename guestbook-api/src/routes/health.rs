//! Health Check Endpoints
//!
//! Provides Kubernetes-compatible health check endpoints:
//! - /health/ping - Simple liveness check
//! - /health/ready - Store and cache connectivity check
//! - /health/live - Process alive check
//!
//! A missing dependency reports `degraded`. So does an unreachable presence
//! cache, since creates go on without it. Only an unreachable visitor store
//! fails readiness.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use guestbook_core::{CacheError, GuestbookError, GuestbookResult};
use guestbook_storage::PresenceCache;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthDetails {
    pub mode: String,
    pub store: ComponentHealth,
    pub cache: ComponentHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolHealth>,
}

/// Connection pool snapshot for the presence cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PoolHealth {
    pub max_size: usize,
    pub in_use: usize,
    pub available: usize,
    pub hit_rate: f64,
}

impl PoolHealth {
    fn from_cache(cache: &dyn PresenceCache) -> Self {
        let status = cache.status();
        Self {
            max_size: status.max_size,
            in_use: status.in_use(),
            available: status.available,
            hit_rate: cache.stats().hit_rate(),
        }
    }
}

impl ComponentHealth {
    fn not_configured() -> Self {
        Self {
            status: HealthStatus::Degraded,
            backend: None,
            latency_ms: None,
            error: None,
            pool: None,
        }
    }

    fn with_pool(mut self, pool: PoolHealth) -> Self {
        self.pool = Some(pool);
        self
    }
}

/// Fixed description of a failed readiness check. Backend detail only goes to the log.
fn failure_reason(err: &GuestbookError) -> &'static str {
    match err {
        GuestbookError::Store(_) => "visitor store unreachable",
        GuestbookError::Cache(CacheError::PoolExhausted { .. }) => "connection pool exhausted",
        GuestbookError::Cache(_) => "presence cache unreachable",
        GuestbookError::Validation(_) | GuestbookError::Config(_) => "check failed",
    }
}

/// Combine component states: any failure wins, then any missing dependency.
fn overall_status(components: &[&ComponentHealth]) -> HealthStatus {
    if components.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if components.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
#[utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Service is responding", body = String),
    ),
)]
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = HealthResponse),
    ),
)]
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check (store and cache connectivity)
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready, possibly without a cache or store", body = HealthResponse),
        (status = 503, description = "The configured visitor store is unreachable", body = HealthResponse),
    ),
)]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let visitors = &state.visitors;

    let store = match visitors.store() {
        Some(store) => {
            check_component(store.backend_name(), HealthStatus::Unhealthy, store.ping()).await
        }
        None => ComponentHealth::not_configured(),
    };
    let cache = match visitors.cache() {
        Some(cache) => {
            check_component(cache.backend_name(), HealthStatus::Degraded, cache.ping())
                .await
                .with_pool(PoolHealth::from_cache(cache.as_ref()))
        }
        None => ComponentHealth::not_configured(),
    };

    let status = overall_status(&[&store, &cache]);
    let response = HealthResponse {
        status,
        message: None,
        details: Some(HealthDetails {
            mode: visitors.mode().to_string(),
            store,
            cache,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}

/// Run one readiness check. `on_failure` is the status a failed check reports.
async fn check_component<F>(backend: &str, on_failure: HealthStatus, check: F) -> ComponentHealth
where
    F: Future<Output = GuestbookResult<()>>,
{
    let start = Instant::now();
    match check.await {
        Ok(()) => ComponentHealth {
            status: HealthStatus::Healthy,
            backend: Some(backend.to_string()),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
            pool: None,
        },
        Err(e) => {
            tracing::warn!(backend, error = %e, "Readiness check failed");
            ComponentHealth {
                status: on_failure,
                backend: Some(backend.to_string()),
                latency_ms: None,
                error: Some(failure_reason(&e).to_string()),
                pool: None,
            }
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}
