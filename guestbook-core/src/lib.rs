//! Guestbook Core - Visitor Types
//!
//! Data types shared by every guestbook crate: the visitor payload and
//! stored record, the greeting a create request produces, the name policy,
//! the error taxonomy, and service-credential discovery.

pub mod credentials;
pub mod entities;
pub mod error;
pub mod greeting;
pub mod identity;
pub mod policy;

pub use credentials::{CredentialEnv, CredentialSource, ServiceLookup, ServiceUri};
pub use entities::{Visitor, VisitorRecord, PRESENCE_MARKER};
pub use error::{
    CacheError, ConfigError, GuestbookError, GuestbookResult, StoreError, ValidationError,
};
pub use greeting::Greeting;
pub use identity::{new_visitor_id, Timestamp, VisitorId};
pub use policy::NamePolicy;
