//! Service Layer
//!
//! Business logic for the visitor routes. Services own the policy; route
//! handlers only translate between HTTP and service calls.

mod visitor_service;

pub use visitor_service::*;
