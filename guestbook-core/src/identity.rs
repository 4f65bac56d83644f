//! Identity types for guestbook records

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Visitor record identifier using UUIDv7 for timestamp-sortable IDs.
///
/// Assigned by the store on persist, never by the service layer.
pub type VisitorId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 VisitorId (timestamp-sortable).
pub fn new_visitor_id() -> VisitorId {
    Uuid::now_v7()
}
