//! Common types shared across the tc-detect workspace.
//!
//! Gridded model output is held in flat row-major buffers: [`Field3`] for
//! `(time, lat, lon)` and [`Field4`] for `(time, level, lat, lon)`. The
//! horizontal coordinates live in [`LatLonGrid`], the time coordinate in
//! [`TimeAxis`].

pub mod error;
pub mod field;
pub mod grid;
pub mod time;

pub use error::{TcError, TcResult};
pub use field::{Field3, Field4};
pub use grid::{is_missing, LatLonGrid, LatOrder, MISSING_VALUE};
pub use time::TimeAxis;
