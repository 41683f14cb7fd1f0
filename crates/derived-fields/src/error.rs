//! Error types for diagnostic computation.

use thiserror::Error;

/// Errors raised while deriving diagnostic fields.
#[derive(Error, Debug)]
pub enum DerivedFieldError {
    /// Input fields do not agree with each other or with the grid.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A per-time-step vorticity task failed.
    #[error("vorticity task for time step {step} failed: {message}")]
    TaskFailed { step: usize, message: String },

    /// The worker pool could not be created.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Store(#[from] grid_store::StoreError),

    #[error(transparent)]
    Grid(#[from] tc_common::TcError),
}

impl DerivedFieldError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn task_failed(step: usize, msg: impl Into<String>) -> Self {
        Self::TaskFailed {
            step,
            message: msg.into(),
        }
    }
}

/// Result type for diagnostic operations.
pub type Result<T> = std::result::Result<T, DerivedFieldError>;
