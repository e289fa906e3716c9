//! Error types for the SQL adapter

use thiserror::Error;

/// Type alias for Results using StorageError
pub type Result<T> = std::result::Result<T, StorageError>;

/// Main error type for adapter operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific error raised by the connector or executor
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key is longer than the configured key size
    #[error("Key too long: {len} characters exceeds the maximum of {max}")]
    KeyTooLong {
        /// Length of the rejected key in characters
        len: usize,
        /// Configured maximum key length
        max: usize,
    },

    /// A row returned by the backend did not have the expected shape
    #[error("Malformed row: {0}")]
    MalformedRow(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error with custom message
    #[error("{0}")]
    Other(String),
}

/// Backend-specific errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// The connector failed to produce an executor
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The idempotent create-table statement failed
    #[error("Table creation failed: {0}")]
    CreateTable(String),

    /// A query failed after the connection was established
    #[error("Query failed: {0}")]
    Query(String),

    /// sqlx driver error
    #[cfg(feature = "sqlx-backend")]
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl StorageError {
    /// Check if the error happened while bootstrapping the connection
    pub fn is_bootstrap(&self) -> bool {
        matches!(
            self,
            StorageError::Backend(BackendError::Connect(_) | BackendError::CreateTable(_))
        )
    }

    /// Check if the error was caused by caller input rather than the backend
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, StorageError::KeyTooLong { .. })
    }

    /// Shorthand for a connector failure
    pub fn connect(reason: impl Into<String>) -> Self {
        StorageError::Backend(BackendError::Connect(reason.into()))
    }

    /// Shorthand for a query failure
    pub fn query(reason: impl Into<String>) -> Self {
        StorageError::Backend(BackendError::Query(reason.into()))
    }
}

#[cfg(feature = "sqlx-backend")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Backend(BackendError::Sqlx(err))
    }
}

// Implement From for common error types
impl From<String> for StorageError {
    fn from(s: String) -> Self {
        StorageError::Other(s)
    }
}

impl From<&str> for StorageError {
    fn from(s: &str) -> Self {
        StorageError::Other(s.to_string())
    }
}
