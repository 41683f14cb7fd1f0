//! Error types shared by the grid and field containers.

use thiserror::Error;

/// Result type alias using TcError.
pub type TcResult<T> = Result<T, TcError>;

/// Errors raised while building or indexing grids and fields.
#[derive(Debug, Error)]
pub enum TcError {
    #[error("Shape mismatch for {what}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(String),

    #[error("Invalid time axis: {0}")]
    InvalidTime(String),
}

impl TcError {
    pub fn shape_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    pub fn out_of_bounds(msg: impl Into<String>) -> Self {
        Self::IndexOutOfBounds(msg.into())
    }
}
