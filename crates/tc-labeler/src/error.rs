//! Error types for labeling and output assembly.

use thiserror::Error;

/// Errors raised while labeling storms or writing the case outputs.
#[derive(Error, Debug)]
pub enum LabelError {
    /// The raw mask does not divide into whole time steps of the grid.
    #[error("raw mask has {len} values, not a multiple of {cells} grid cells")]
    MaskSize { len: usize, cells: usize },

    /// Two volumes that must align do not.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Track(#[from] track_parser::TrackError),

    #[error(transparent)]
    Store(#[from] grid_store::StoreError),

    #[error(transparent)]
    Grid(#[from] tc_common::TcError),
}

impl LabelError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }
}

/// Result type for labeling operations.
pub type Result<T> = std::result::Result<T, LabelError>;
