//! Error types for the alert subsystem

use thiserror::Error;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the alert subsystem
///
/// Every error aborts the current attempt handling and is returned to the
/// caller. The subsystem never retries internally; the enclosing delivery
/// worker decides whether to retry the whole attempt or move on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration error (file parsing, environment extraction)
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Redis error
    #[error("Redis error: {0}")]
    Redis(Box<redis::RedisError>),

    /// Alert state store transport error
    #[error("{0}")]
    Store(String),

    /// Alert callback delivery error
    #[error("failed to send alert: {0}")]
    Notify(String),

    /// Destination disable error
    #[error("{0}")]
    Disable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(Box<serde_json::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(Box::new(err))
    }
}
