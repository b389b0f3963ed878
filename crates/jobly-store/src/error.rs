//! Error types for jobly-store

use crate::validate::ValidationErrors;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for data-access operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or empty caller input (e.g. an empty partial update)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation failures
    #[error("Validation error: {0}")]
    Invalid(ValidationErrors),

    /// A record with the same business key already exists
    #[error("Duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// No row matched the requested id
    #[error("No {entity}: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Stable discriminant for [`StoreError`].
///
/// Everything that is not a deliberate caller-facing condition collapses into
/// [`ErrorKind::Storage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Duplicate,
    NotFound,
    Storage,
}

impl ErrorKind {
    /// Conventional HTTP status for this kind of failure.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Validation | Self::Duplicate => 400,
            Self::NotFound => 404,
            Self::Storage => 500,
        }
    }
}

impl StoreError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not found error for `entity` identified by `id`
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a duplicate error for `entity` with a human readable business key
    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            key: key.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Invalid(_) => ErrorKind::Validation,
            Self::Duplicate { .. } => ErrorKind::Duplicate,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Query(_)
            | Self::Connection(_)
            | Self::Pool(_)
            | Self::Timeout(_)
            | Self::Decode { .. }
            | Self::Config(_) => ErrorKind::Storage,
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if this is a duplicate error
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// SQLSTATE of the underlying database error, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Query(err) => err.as_db_error().map(|db| db.code().code()),
            _ => None,
        }
    }

    /// Check if this wraps a unique constraint violation (SQLSTATE 23505)
    pub fn is_unique_violation(&self) -> bool {
        self.sql_state() == Some("23505")
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Invalid(errors)
    }
}
