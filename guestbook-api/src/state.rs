//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use crate::services::VisitorService;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Visitor operations over the configured store and cache.
    pub visitors: Arc<VisitorService>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(visitors: VisitorService) -> Self {
        Self {
            visitors: Arc::new(visitors),
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(Arc<VisitorService>, visitors);
crate::impl_from_ref!(Instant, start_time);
