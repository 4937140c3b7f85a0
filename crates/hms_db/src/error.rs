//! Error types for the database client

use thiserror::Error;

/// Errors that can occur when working with the booking store
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A uniqueness constraint or state guard rejected a write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A row the write depends on does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("Other database error: {0}")]
    Other(String),
}

/// Returns true when a sqlx error is a UNIQUE / primary key violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() || db_err.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}
