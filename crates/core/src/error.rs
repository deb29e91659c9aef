//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Domain-level error.
///
/// Deterministic business failures live here; the store crate carries its own
/// infrastructure error and converts at the engine boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The group's rate/fx settings are missing for the requested operation.
    /// Nothing is recorded; the caller must prompt for configuration first.
    #[error("group not configured: {0}")]
    Configuration(String),

    /// A value failed validation (e.g. non-positive amount reached the core).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Nothing matched the given reference or id. No mutation was performed;
    /// safe to surface as a user-facing "nothing to undo".
    #[error("not found")]
    NotFound,

    /// An invariant-violating double assignment (e.g. attaching a second,
    /// different external reference). Indicates a caller bug; log it.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A per-chat writer lock could not be acquired within its bounded wait.
    /// Transient; the caller may retry with backoff.
    #[error("busy: {0}")]
    Busy(String),

    /// Durable storage failed. The atomic-write guarantee means no partial
    /// state was left behind; never retried automatically inside the core.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the operation may be retried as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}
