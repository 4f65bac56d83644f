//! Visitor entity types

use serde::{Deserialize, Serialize};

use crate::identity::{Timestamp, VisitorId};

/// Cache value written under a visitor's name once that name is stored.
pub const PRESENCE_MARKER: &str = "persisted";

/// Inbound visitor payload.
///
/// The name is optional on the wire: older clients send `{}` or
/// `{"name": null}`, and whether that is acceptable is decided by
/// [`NamePolicy`](crate::NamePolicy), not by deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Visitor {
    /// Display name, also the deduplication key for the presence cache.
    #[serde(default)]
    pub name: Option<String>,
}

impl Visitor {
    /// Create a visitor with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Borrow the name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// A visitor as held by a store.
///
/// Stores may contain records written by other clients, so `name` can be
/// missing or empty here even when the service rejects such names on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VisitorRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: VisitorId,
    #[serde(default)]
    pub name: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl VisitorRecord {
    /// The record's name if it is present and non-empty.
    pub fn listed_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Consume the record, yielding a listable name.
    pub fn into_listed_name(self) -> Option<String> {
        self.name.filter(|name| !name.is_empty())
    }
}
