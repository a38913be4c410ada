//! Base error type shared by the workspace crates.

use thiserror::Error;

/// Result type alias for PB Bot operations.
pub type Result<T> = std::result::Result<T, PbBotError>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum PbBotError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging could not be initialised.
    #[error("Logging error: {0}")]
    Logging(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PbBotError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a logging error.
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging(message.into())
    }
}
