//! Error types for field persistence.

use thiserror::Error;

/// Errors that can occur while reading or writing stored fields.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open an array or store.
    #[error("failed to open array: {0}")]
    OpenFailed(String),

    /// Failed to read data from an array.
    #[error("failed to read array data: {0}")]
    ReadFailed(String),

    /// Failed to write an array.
    #[error("failed to write array: {0}")]
    WriteFailed(String),

    /// Invalid or missing metadata in the array attributes.
    #[error("invalid array metadata: {0}")]
    InvalidMetadata(String),

    /// A required model variable is absent from the input.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Grid or field shape error.
    #[error(transparent)]
    Grid(#[from] tc_common::TcError),
}

impl StoreError {
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable(name.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
