//! Tracing Subscriber Initialization
//!
//! Sets up the global `tracing` subscriber: an `EnvFilter` driven by
//! `RUST_LOG` and a `fmt` layer emitting JSON lines (or human-readable
//! lines for local runs).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "guestbook_api=debug,guestbook_storage=debug,tower_http=debug,info";

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("GUESTBOOK_SERVICE_NAME")
                .unwrap_or_else(|_| "guestbook-api".to_string()),
            service_version: std::env::var("GUESTBOOK_SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            environment: std::env::var("GUESTBOOK_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            json_logs: std::env::var("GUESTBOOK_LOG_FORMAT")
                .map(|s| s.to_lowercase() != "pretty")
                .unwrap_or(true),
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Call once at application startup before any tracing occurs. A second
/// call fails because a global subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = config.service_name,
        service_version = config.service_version,
        environment = config.environment,
        "Telemetry initialized"
    );

    Ok(())
}
