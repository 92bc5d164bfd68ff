//! Common error types for Ongaku

use thiserror::Error;

/// Common result type for Ongaku operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Ongaku stages
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio file could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Cepstral or manifold analysis failure
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
