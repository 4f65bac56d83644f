//! Guestbook API - HTTP Layer
//!
//! Axum service exposing the visitor resource. Wires the visitor service to
//! its optional PostgreSQL store and Redis presence cache, and carries the
//! ambient pieces around it: configuration, error mapping, structured
//! logging, Prometheus metrics and the OpenAPI document.

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod macros;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use bootstrap::{build_cache, build_service, build_store};
pub use config::{ApiConfig, CacheBackend, StoreBackend};
pub use db::{DbConfig, PostgresVisitorStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::{ServiceMode, VisitorService};
pub use state::AppState;
