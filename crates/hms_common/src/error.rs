// --- File: crates/hms_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The presentation-layer error shared by all clinic services.
///
/// Domain crates keep their own error enums and implement
/// `From<DomainError> for HmsError`; the message of the client-facing
/// variants is what ends up in the JSON error body.
#[derive(Error, Debug)]
pub enum HmsError {
    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Caller identity is missing or malformed
    #[error("{0}")]
    AuthError(String),

    /// Caller is authenticated but has the wrong role
    #[error("{0}")]
    ForbiddenError(String),

    /// Input failed validation
    #[error("{0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The request conflicts with the current state of a resource
    #[error("{0}")]
    ConflictError(String),

    /// The requested resource does not exist
    #[error("{0}")]
    NotFoundError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for HmsError {
    fn status_code(&self) -> u16 {
        match self {
            HmsError::ConfigError(_) => 500,
            HmsError::AuthError(_) => 401,
            HmsError::ForbiddenError(_) => 403,
            HmsError::ValidationError(_) => 400,
            HmsError::DatabaseError(_) => 500,
            HmsError::ConflictError(_) => 409,
            HmsError::NotFoundError(_) => 404,
            HmsError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, HmsError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, HmsError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, HmsError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| HmsError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, HmsError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| HmsError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> HmsError {
    HmsError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> HmsError {
    HmsError::NotFoundError(message.to_string())
}

pub fn forbidden<T: fmt::Display>(message: T) -> HmsError {
    HmsError::ForbiddenError(message.to_string())
}
