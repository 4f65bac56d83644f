//! Visitor REST API Routes
//!
//! `GET` lists visitor names as a JSON array; `POST` registers a visitor
//! and answers with a plain-text greeting.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use guestbook_core::Visitor;
use std::sync::Arc;

use crate::constants::{GREETING_CONTENT_TYPE, VISITORS_PATH};
use crate::error::{ApiError, ApiResult};
use crate::services::VisitorService;
use crate::state::AppState;

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /visitors - List the names of all stored visitors
#[utoipa::path(
    get,
    path = "/visitors",
    tag = "Visitors",
    responses(
        (status = 200, description = "Visitor names in store order", body = Vec<String>),
        (status = 503, description = "Visitor store unavailable", body = ApiError),
    ),
)]
pub async fn list_visitors(
    State(service): State<Arc<VisitorService>>,
) -> ApiResult<impl IntoResponse> {
    let names = service.list_names().await?;
    Ok(Json(names))
}

/// POST /visitors - Register a visitor
#[utoipa::path(
    post,
    path = "/visitors",
    tag = "Visitors",
    request_body = Visitor,
    responses(
        (status = 200, description = "Greeting for the visitor", body = String, content_type = "text/plain"),
        (status = 400, description = "Missing name or malformed body", body = ApiError),
        (status = 503, description = "Visitor store unavailable", body = ApiError),
    ),
)]
pub async fn create_visitor(
    State(service): State<Arc<VisitorService>>,
    payload: Result<Json<Visitor>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(visitor) = payload.map_err(ApiError::from)?;
    let greeting = service.create(visitor).await?;
    Ok(([(header::CONTENT_TYPE, GREETING_CONTENT_TYPE)], greeting.to_string()))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the visitor router, answering with and without a trailing slash.
pub fn create_router() -> Router<AppState> {
    let trailing = format!("{}/", VISITORS_PATH);
    Router::new()
        .route(VISITORS_PATH, get(list_visitors).post(create_visitor))
        .route(&trailing, get(list_visitors).post(create_visitor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use guestbook_storage::InMemoryVisitorStore;
    use tower::ServiceExt;

    fn app() -> Router {
        let service = VisitorService::new(Some(Arc::new(InMemoryVisitorStore::new())), None);
        create_router().with_state(AppState::new(service))
    }

    #[tokio::test]
    async fn test_trailing_slash_is_served() {
        let response = app()
            .oneshot(Request::get("/visitors/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"[]");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = app()
            .oneshot(
                Request::post("/visitors")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
