//! Error types for plumbstock-core

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from the item store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The key-value backend refused or failed the operation
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The collection could not be encoded for persistence
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised by a key-value backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Storage is disabled or cannot be reached at all
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The write would exceed the backend's capacity
    #[error("quota exceeded writing {key}: {needed} bytes over a {quota} byte quota")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    /// Filesystem failure in a file-backed store
    #[error("IO error: {0}")]
    Io(String),
}

/// Errors from image selection.
#[derive(Error, Debug)]
pub enum ImageError {
    /// Source image exceeds the configured limit
    #[error("Image is too large ({size} bytes). Please select an image under {limit} bytes.")]
    TooLarge { size: usize, limit: usize },

    /// Source file could not be read
    #[error("Could not read image: {0}")]
    Io(String),
}

/// Configuration loading or validation error
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File contents could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Config file could not be read or written
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ImageError {
    fn from(err: std::io::Error) -> Self {
        ImageError::Io(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}
