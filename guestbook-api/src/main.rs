//! Guestbook API Server Entry Point
//!
//! Bootstraps configuration, builds the visitor service and starts the Axum
//! HTTP server.

use std::net::SocketAddr;

use axum::Router;
use guestbook_api::telemetry::{init_tracing, TelemetryConfig};
use guestbook_api::{build_service, create_api_router, ApiConfig, ApiError, ApiResult, AppState};
use guestbook_core::GuestbookError;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env().map_err(GuestbookError::from)?;

    let service = build_service(&api_config).await;
    let app: Router = create_api_router(AppState::new(service), &api_config);

    let addr = resolve_bind_addr(&api_config)?;
    tracing::info!(%addr, "Starting guestbook API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr(config: &ApiConfig) -> ApiResult<SocketAddr> {
    let addr = config.bind_address();
    addr.parse::<SocketAddr>().map_err(|e| {
        ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
    })
}
