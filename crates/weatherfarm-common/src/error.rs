//! Error types for Weather Farm.

use thiserror::Error;

/// Top-level error type for Weather Farm operations.
#[derive(Debug, Error)]
pub enum FarmError {
    /// Persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a key-value preference store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Values could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backing data could not be decoded
    #[error("Corrupted store: {0}")]
    Corrupted(String),
}

/// Result type alias for Weather Farm operations.
pub type FarmResult<T> = Result<T, FarmError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
