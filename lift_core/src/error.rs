//! Error types for the lift_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lift_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input rejected before any write was attempted
    #[error("Validation error: {0}")]
    Validation(String),

    /// An addressed document or list position does not exist (or has shifted)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing document store could not be reached or refused the operation
    #[error("Store error: {0}")]
    Store(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for errors caused by caller input rather than the environment
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// True when an addressed document or index no longer exists
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
