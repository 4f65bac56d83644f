//! Helper macros for the API crate.

/// Implement `FromRef<AppState>` for a field of the application state, so
/// handlers can extract just the part they need.
///
/// # Example
/// ```ignore
/// impl_from_ref!(Arc<VisitorService>, visitors);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for Arc<VisitorService> {
///     fn from_ref(state: &AppState) -> Self {
///         state.visitors.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
