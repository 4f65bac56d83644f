//! Greetings returned by the create operation
//!
//! The create endpoint answers with plain text rather than a structured
//! body, so the three outcomes are kept as an enum and rendered only at the
//! edge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a create request did, carrying the name it was made for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "name", rename_all = "snake_case")]
pub enum Greeting {
    /// No store is configured; nothing was persisted or cached.
    Hello(String),
    /// The name was absent from the cache and has been persisted.
    Added(String),
    /// The cache already held a presence marker for the name.
    Returning(String),
}

impl Greeting {
    /// Name the greeting is addressed to.
    pub fn name(&self) -> &str {
        match self {
            Greeting::Hello(name) | Greeting::Added(name) | Greeting::Returning(name) => name,
        }
    }

    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Greeting::Hello(_) => "hello",
            Greeting::Added(_) => "added",
            Greeting::Returning(_) => "returning",
        }
    }

    /// Whether this request wrote to the store.
    pub fn persisted(&self) -> bool {
        matches!(self, Greeting::Added(_))
    }
}

impl fmt::Display for Greeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Greeting::Hello(name) => write!(f, "Hello {}!", name),
            Greeting::Added(name) => {
                write!(f, "Hello {}! I've added you to the database.", name)
            }
            Greeting::Returning(name) => {
                write!(f, "Hello {}! It's nice to see you again.", name)
            }
        }
    }
}
