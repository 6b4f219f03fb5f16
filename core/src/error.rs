//! Error types for core value parsing and validation.

use thiserror::Error;

/// Errors raised while parsing versions, timestamps, or prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Version string is not strict `MAJOR.MINOR.PATCH`.
    #[error("invalid schema version '{0}': expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    /// Epoch seconds fall outside the representable datetime range.
    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    /// Datetime string does not match `YYYY-MM-DD HH:MM:SS`.
    #[error("invalid datetime '{0}': expected YYYY-MM-DD HH:MM:SS")]
    InvalidDate(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
