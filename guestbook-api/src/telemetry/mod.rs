//! Guestbook Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing` and Prometheus metrics for the API
//! layer. Both work standalone without external collectors.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, GuestbookMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracing, TelemetryConfig};
