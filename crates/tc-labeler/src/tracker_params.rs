//! Grid parameters compiled into the object tracker.
//!
//! The tracker reads its domain from a Fortran module of `PARAMETER`
//! declarations. Before a case is tracked the declarations below are
//! rewritten from the case's grid; every other line is kept as is.

use std::path::Path;

use tc_common::LatLonGrid;
use tracing::{info, warn};

use crate::error::{LabelError, Result};

/// Domain description for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerParameters {
    pub domainsize_x: usize,
    pub domainsize_y: usize,
    pub time_steps: usize,
    pub lat_first: f64,
    pub lat_inc: f64,
    pub lon_inc: f64,
    /// Grid already spans pole to pole.
    pub lpole: bool,
}

impl TrackerParameters {
    pub fn from_grid(grid: &LatLonGrid, time_steps: usize) -> Self {
        Self {
            domainsize_x: grid.nlon(),
            domainsize_y: grid.nlat(),
            time_steps,
            lat_first: grid.lat.first().copied().unwrap_or_default(),
            lat_inc: grid.lat_step().abs(),
            lon_inc: grid.lon_step().abs(),
            lpole: grid.reaches_poles(),
        }
    }

    /// Replacement for a declaration line, if `line` declares one of ours.
    fn replacement(&self, line: &str) -> Option<String> {
        let decl = if line.contains("INTEGER, PARAMETER    :: domainsize_x") {
            format!("INTEGER, PARAMETER    :: domainsize_x = {}", self.domainsize_x)
        } else if line.contains("INTEGER, PARAMETER    :: domainsize_y") {
            format!("INTEGER, PARAMETER    :: domainsize_y = {}", self.domainsize_y)
        } else if line.contains("INTEGER, PARAMETER    :: time_steps") {
            format!("INTEGER, PARAMETER    :: time_steps = {}", self.time_steps)
        } else if line.contains("REAL, PARAMETER       :: lat_first") {
            format!("REAL, PARAMETER       :: lat_first = {:.7}", self.lat_first)
        } else if line.contains("REAL, PARAMETER       :: lat_inc") {
            format!("REAL, PARAMETER       :: lat_inc = {:.9}", self.lat_inc)
        } else if line.contains("REAL, PARAMETER       :: lon_inc") {
            format!("REAL, PARAMETER       :: lon_inc = {:.7}", self.lon_inc)
        } else if line.contains("LOGICAL, PARAMETER    :: lpole") {
            let flag = if self.lpole { ".TRUE." } else { ".FALSE." };
            format!("LOGICAL, PARAMETER    :: lpole = {}", flag)
        } else {
            return None;
        };
        Some(decl + "\n")
    }

    /// Rewrite the declarations in `source`. Returns the new text and the
    /// number of lines replaced.
    pub fn apply(&self, source: &str) -> (String, usize) {
        let mut out = String::with_capacity(source.len());
        let mut replaced = 0;
        for line in source.split_inclusive('\n') {
            match self.replacement(line) {
                Some(decl) => {
                    out.push_str(&decl);
                    replaced += 1;
                }
                None => out.push_str(line),
            }
        }
        (out, replaced)
    }

    /// Rewrite the parameter file at `path` in place.
    pub fn update_file(&self, path: &Path) -> Result<usize> {
        let source = std::fs::read_to_string(path).map_err(|e| LabelError::io(path, e))?;
        let (updated, replaced) = self.apply(&source);
        std::fs::write(path, updated).map_err(|e| LabelError::io(path, e))?;

        if replaced < 7 {
            warn!(path = %path.display(), replaced, "Tracker parameter file is missing declarations");
        }
        info!(
            path = %path.display(),
            nx = self.domainsize_x,
            ny = self.domainsize_y,
            nt = self.time_steps,
            lpole = self.lpole,
            "Updated tracker parameters"
        );
        Ok(replaced)
    }
}
