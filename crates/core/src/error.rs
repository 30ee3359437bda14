//! Domain error model.

use thiserror::Error;

/// Result type used across the engine's domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deliberately small: the engine degrades gracefully per record, so most
/// data-quality conditions are skip reasons or reconciliation deltas, not
/// errors. Only request-level problems (a malformed window, an unparseable
/// id) are worth failing a whole computation for.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. a reporting window ending before it starts).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
