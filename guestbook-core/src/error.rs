//! Error types for guestbook operations

use thiserror::Error;

/// Visitor store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Visitor store unavailable ({backend}): {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("Visitor write failed ({backend}): {reason}")]
    WriteFailed { backend: String, reason: String },

    #[error("Visitor store lock poisoned")]
    LockPoisoned,
}

/// Presence cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Presence cache unavailable ({backend}): {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("Presence cache pool exhausted ({backend})")]
    PoolExhausted { backend: String },

    #[error("Cache command {command} failed ({backend}): {reason}")]
    CommandFailed {
        backend: String,
        command: String,
        reason: String,
    },

    #[error("Presence cache lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed service credentials in {source_name}: {reason}")]
    MalformedCredentials { source_name: String, reason: String },
}

/// Master error type for all guestbook errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuestbookError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for guestbook operations.
pub type GuestbookResult<T> = Result<T, GuestbookError>;
