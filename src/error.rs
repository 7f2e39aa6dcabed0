use std::fmt;

use thiserror::Error;

/// The data operation an error or statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::Query => "Query",
            Operation::Select => "Select query",
            Operation::Insert => "Insert query",
            Operation::Update => "Update query",
            Operation::Delete => "Delete query",
        };
        f.write_str(label)
    }
}

/// Error type for dbrs operations
#[derive(Debug, Error)]
pub enum DbRsError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Not connected to the database.")]
    NotConnected,

    #[error("{operation} failed: {message}")]
    Query { operation: Operation, message: String },

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Placeholder :{0} is bound more than once")]
    DuplicatePlaceholder(String),

    #[error("{0} requires at least one condition")]
    MissingConditions(Operation),

    #[error("{0} requires at least one field")]
    EmptyFields(Operation),

    #[error("Invalid connection config: {0}")]
    InvalidConfig(String),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

impl DbRsError {
    pub(crate) fn query(operation: Operation, err: BackendError) -> Self {
        DbRsError::Query {
            operation,
            message: err.0,
        }
    }
}

/// Failure reported by a database client, carrying its original message.
///
/// Backends return this; the driver wraps it with the failing operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<tokio_postgres::Error> for BackendError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self(err.to_string())
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(err: rusqlite::Error) -> Self {
        Self(err.to_string())
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        Self(err.to_string())
    }
}

/// Result type alias for dbrs operations
pub type Result<T> = std::result::Result<T, DbRsError>;
