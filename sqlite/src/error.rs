//! Error types for schema, record, and migration operations.
//!
//! Each component has its own error enum so callers can tell a caller
//! mistake (no fields, empty payload) from an engine rejection.

use resource_store_core::SchemaVersion;
use resource_store_db::ConfigError;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors raised while creating or extending a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No column definitions were supplied.
    #[error("no fields supplied for table '{table}'")]
    NoFields { table: String },

    /// The primary key column is not among the supplied fields.
    #[error("primary key '{primary_key}' is not a field of table '{table}'")]
    MissingPrimaryKey { table: String, primary_key: String },

    /// The engine refused the DDL (reserved word, bad type, constraint conflict).
    #[error("engine rejected schema change for '{table}': {detail}")]
    EngineRejected { table: String, detail: String },
}

impl SchemaError {
    pub(crate) fn rejected(table: &str, err: rusqlite::Error) -> Self {
        SchemaError::EngineRejected {
            table: table.to_string(),
            detail: err.to_string(),
        }
    }
}

/// Errors raised by record operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// No row matched the key.
    #[error("no row in '{table}' with key {key}")]
    NotFound { table: String, key: String },

    /// The engine rejected a write due to a uniqueness or foreign key constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Empty payload or predicate, or an unusable column name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other engine failure.
    #[error("database error: {0}")]
    Database(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for RecordError {
    fn from(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            RecordError::ConstraintViolation(err.to_string())
        } else {
            RecordError::Database(err)
        }
    }
}

/// Failure reported by an upgrade step's action.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Step-specific failure described by the step itself.
    #[error("{0}")]
    Failed(String),
}

/// Errors raised by the [`Migrator`](crate::Migrator).
#[derive(Debug, Error)]
pub enum MigrationError {
    /// An upgrade step failed; the version stays at the last completed step.
    #[error("upgrade step '{step}' (target {target}) failed: {cause}")]
    StepFailed {
        step: String,
        target: SchemaVersion,
        #[source]
        cause: StepError,
    },

    /// Two registered steps share the same target version.
    #[error("more than one upgrade step targets version {0}")]
    DuplicateTarget(SchemaVersion),

    /// The stored version marker is not a valid `MAJOR.MINOR.PATCH` string.
    #[error("stored version '{value}' under '{key}' is not a valid schema version")]
    InvalidStoredVersion { key: String, value: String },

    /// Reading or writing the version marker failed.
    #[error("option store error: {0}")]
    Options(#[from] ConfigError),
}

/// Convenience alias for results with [`RecordError`].
pub type Result<T> = std::result::Result<T, RecordError>;
