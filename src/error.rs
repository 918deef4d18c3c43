//! Error types for neighbourpro.
//!
//! Every operation returns a typed failure; the core never logs, retries or
//! swallows one. [`Error::kind`] gives the API layer a stable classification
//! to map onto transport responses.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("concurrent update conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("dependency failure: {0}")]
    DependencyFailure(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidState,
    Validation,
    ConcurrencyConflict,
    DependencyFailure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::Validation(_) => ErrorKind::Validation,
            Error::ConcurrencyConflict(_) => ErrorKind::ConcurrencyConflict,
            Error::DependencyFailure(_)
            | Error::Database(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Other(_) => ErrorKind::DependencyFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
