//! OpenAPI Specification for the Guestbook API
//!
//! Generated with utoipa from the route annotations and schema derives.

use utoipa::{Modify, OpenApi};

use crate::constants::{API_PREFIX, VISITORS_PATH};
use crate::error::{ApiError, ErrorCode};
use crate::routes::{health, visitors};
use crate::telemetry::metrics;

use guestbook_core::Visitor;

/// OpenAPI document for the Guestbook API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Guestbook API",
        description = "Visitor registration with cache-assisted duplicate detection",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:9080", description = "Local Development")
    ),
    tags(
        (name = "Visitors", description = "List and register visitors"),
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        visitors::list_visitors,
        visitors::create_visitor,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            ApiError, ErrorCode, Visitor,
            health::HealthResponse, health::HealthStatus, health::HealthDetails,
            health::ComponentHealth,
            health::PoolHealth,
        )
    ),
    modifiers(&ApiPrefixAddon)
)]
pub struct ApiDoc;

/// Documents the `/api` mirror of the visitor routes.
struct ApiPrefixAddon;

impl Modify for ApiPrefixAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(item) = openapi.paths.paths.get(VISITORS_PATH).cloned() {
            openapi
                .paths
                .paths
                .insert(format!("{}{}", API_PREFIX, VISITORS_PATH), item);
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}
