//! Name acceptance policy for the create operation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How the create operation treats missing or blank names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePolicy {
    /// Missing or whitespace-only names are a validation error.
    #[default]
    Reject,
    /// Names are taken as-is; a missing name becomes the empty string.
    Accept,
}

impl NamePolicy {
    /// Turn an inbound name into the key used for caching and storage.
    ///
    /// Under `Accept` the name is never trimmed or altered, so the cache key
    /// is exactly what the client sent.
    pub fn resolve(self, name: Option<&str>) -> Result<String, ValidationError> {
        match self {
            NamePolicy::Accept => Ok(name.unwrap_or_default().to_string()),
            NamePolicy::Reject => match name {
                Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
                _ => Err(ValidationError::RequiredFieldMissing {
                    field: "name".to_string(),
                }),
            },
        }
    }
}
