//! Constants for the Guestbook API
//!
//! Centralizing constants makes them easy to find, modify, and test.

// ============================================================================
// SERVER
// ============================================================================

/// Default bind host
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 9080;

// ============================================================================
// CORS
// ============================================================================

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// ROUTES
// ============================================================================

/// Visitor collection path
pub const VISITORS_PATH: &str = "/visitors";

/// Prefix under which the visitor routes are mirrored
pub const API_PREFIX: &str = "/api";

// ============================================================================
// GREETING RESPONSES
// ============================================================================

/// Content type of a greeting
pub const GREETING_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
