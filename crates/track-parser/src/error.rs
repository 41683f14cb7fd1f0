//! Error types for track-file parsing.

use thiserror::Error;

/// Errors raised while reading a track file or filtering its storms.
#[derive(Error, Debug)]
pub enum TrackError {
    /// Content before the first marker, or a group without a storm line.
    #[error("malformed track file at line {line}: {message}")]
    MalformedTrack { line: usize, message: String },

    /// A token that is missing or does not parse.
    #[error("line {line}: cannot parse {field} from {token:?}")]
    ParseError {
        line: usize,
        field: &'static str,
        token: String,
    },

    /// A converted position falls outside the grid or the time axis.
    #[error("storm {storm_id}, line {line}: {message}")]
    IndexOutOfBounds {
        storm_id: u32,
        line: usize,
        message: String,
    },

    /// SST field does not match the grid.
    #[error(transparent)]
    Grid(#[from] tc_common::TcError),

    /// I/O error while streaming the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackError {
    pub fn malformed(line: usize, msg: impl Into<String>) -> Self {
        Self::MalformedTrack {
            line,
            message: msg.into(),
        }
    }

    pub fn parse(line: usize, field: &'static str, token: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            field,
            token: token.into(),
        }
    }

    pub fn out_of_bounds(storm_id: u32, line: usize, msg: impl Into<String>) -> Self {
        Self::IndexOutOfBounds {
            storm_id,
            line,
            message: msg.into(),
        }
    }
}

/// Result type for track operations.
pub type Result<T> = std::result::Result<T, TrackError>;
