//! Error types for configuration and option storage.

use thiserror::Error;

/// Errors that can occur while loading configuration or accessing options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// An option store backend rejected the operation.
    #[error("option store error: {0}")]
    Backend(String),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
