//! Token layout of the tracker's storm and position lines.
//!
//! Storm line: `id ? lifetime ...`. Position line: time index in column 1,
//! one-based fractional grid position in columns 14 (x) and 15 (y). The
//! layout is fixed by the tracker's output format.

use std::str::FromStr;

use tc_common::LatLonGrid;

use crate::error::{Result, TrackError};
use crate::groups::TrackLine;

pub const STORM_ID_COLUMN: usize = 0;
pub const LIFETIME_COLUMN: usize = 2;
pub const TIME_COLUMN: usize = 1;
pub const X_COLUMN: usize = 14;
pub const Y_COLUMN: usize = 15;

fn token<T: FromStr>(line: &TrackLine, column: usize, field: &'static str) -> Result<T> {
    let tok = line
        .text
        .split_whitespace()
        .nth(column)
        .ok_or_else(|| TrackError::parse(line.number, field, format!("<column {} missing>", column)))?;
    tok.parse()
        .map_err(|_| TrackError::parse(line.number, field, tok))
}

/// Identity and duration of one storm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StormHeader {
    pub id: u32,
    /// Number of tracked time steps.
    pub lifetime: u32,
}

impl StormHeader {
    pub fn parse(line: &TrackLine) -> Result<Self> {
        Ok(Self {
            id: token(line, STORM_ID_COLUMN, "storm id")?,
            lifetime: token(line, LIFETIME_COLUMN, "lifetime")?,
        })
    }
}

/// One tracked position in the tracker's index space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPosition {
    pub line: usize,
    pub t: usize,
    /// One-based fractional column.
    pub x: f64,
    /// One-based fractional row.
    pub y: f64,
}

/// Zero-based `(time, row, column)` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridIndex {
    pub t: usize,
    pub j: usize,
    pub i: usize,
}

impl TrackPosition {
    pub fn parse(line: &TrackLine) -> Result<Self> {
        let x: f64 = token(line, X_COLUMN, "x position")?;
        let y: f64 = token(line, Y_COLUMN, "y position")?;
        if !x.is_finite() || !y.is_finite() {
            return Err(TrackError::parse(
                line.number,
                "position",
                format!("{} {}", x, y),
            ));
        }
        Ok(Self {
            line: line.number,
            t: token(line, TIME_COLUMN, "time index")?,
            x,
            y,
        })
    }

    /// Convert to a grid cell: round half to even, shift to zero-based and
    /// wrap one longitude period. Anything still outside the grid or past
    /// `nt` steps is an error.
    pub fn to_grid_index(&self, storm_id: u32, grid: &LatLonGrid, nt: usize) -> Result<GridIndex> {
        let x = grid.wrap_lon_index(self.x.round_ties_even() as i64 - 1);
        let y = self.y.round_ties_even() as i64 - 1;

        if !(0..grid.nlon() as i64).contains(&x) {
            return Err(TrackError::out_of_bounds(
                storm_id,
                self.line,
                format!("x index {} outside 0..{}", x, grid.nlon()),
            ));
        }
        if !(0..grid.nlat() as i64).contains(&y) {
            return Err(TrackError::out_of_bounds(
                storm_id,
                self.line,
                format!("y index {} outside 0..{}", y, grid.nlat()),
            ));
        }
        if self.t >= nt {
            return Err(TrackError::out_of_bounds(
                storm_id,
                self.line,
                format!("time index {} outside 0..{}", self.t, nt),
            ));
        }

        Ok(GridIndex {
            t: self.t,
            j: y as usize,
            i: x as usize,
        })
    }
}
