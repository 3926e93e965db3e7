//! Error types for the gateway core

use thiserror::Error;

/// Result type alias for the gateway core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gateway core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Counter store errors
    #[error("Counter store error: {0}")]
    Store(String),

    /// Redis errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Upstream service rejected or failed the request
    ///
    /// The message is already normalized for end callers; transport and
    /// protocol internals stay out of it.
    #[error("Upstream error: {message}")]
    Upstream {
        /// HTTP status, if a response was received at all
        status: Option<u16>,
        /// Normalized, caller-safe description
        message: String,
    },

    /// Dependent service unavailable
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    /// Build an upstream error from a status and message.
    pub fn upstream(status: impl Into<Option<u16>>, message: impl Into<String>) -> Self {
        Error::Upstream {
            status: status.into(),
            message: message.into(),
        }
    }
}
