//! Model-history input.
//!
//! A [`ModelSource`] hands out the raw model fields of one simulation case.
//! [`ZarrModelSource`] reads a case directory laid out as
//!
//! ```text
//! <case_dir>/
//!     coords.json      time, lat, lon, lev, hyam, hybm, P0
//!     U.zarr/          (time, lev, lat, lon)
//!     V.zarr/
//!     PS.zarr/         (time, lat, lon)
//!     ...
//! ```
//!
//! Levels whose nominal pressure lies above the configured floor
//! (i.e. `lev < level_floor_hpa`) are dropped on read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tc_common::{Field3, Field4, LatLonGrid, TcError, TimeAxis};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::reader::{array_exists, FieldReader};

/// Model variable names.
pub mod vars {
    pub const U: &str = "U";
    pub const V: &str = "V";
    pub const T: &str = "T";
    pub const Q: &str = "Q";
    pub const Z3: &str = "Z3";
    pub const PS: &str = "PS";
    pub const U850: &str = "U850";
    pub const V850: &str = "V850";
    pub const PSL: &str = "PSL";
    pub const SST: &str = "SST";
    pub const TS: &str = "TS";
}

/// Hybrid sigma-pressure coefficients at layer midpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridCoefficients {
    pub hyam: Vec<f64>,
    pub hybm: Vec<f64>,
    /// Reference pressure (Pa).
    pub p0: f64,
}

impl HybridCoefficients {
    fn select(&self, levels: &[usize]) -> Self {
        Self {
            hyam: levels.iter().map(|&k| self.hyam[k]).collect(),
            hybm: levels.iter().map(|&k| self.hybm[k]).collect(),
            p0: self.p0,
        }
    }
}

/// Read-only access to one case's model history.
pub trait ModelSource: Send + Sync {
    fn grid(&self) -> &LatLonGrid;

    fn time_axis(&self) -> &TimeAxis;

    /// Nominal levels (hPa) of the 4-D fields returned by
    /// [`ModelSource::read_field4`], in stored order.
    fn levels(&self) -> &[f64];

    /// Hybrid coefficients matching [`ModelSource::levels`].
    fn hybrid(&self) -> &HybridCoefficients;

    fn has_variable(&self, name: &str) -> bool;

    /// Read a `(time, lat, lon)` variable.
    fn read_field3(&self, name: &str) -> Result<Field3>;

    /// Read a `(time, level, lat, lon)` variable.
    fn read_field4(&self, name: &str) -> Result<Field4>;

    /// The first of `names` this source carries.
    fn first_available<'a>(&self, names: &[&'a str]) -> Option<&'a str> {
        names.iter().copied().find(|name| self.has_variable(name))
    }
}

/// Coordinates shared by every variable of a case (`coords.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseCoordinates {
    pub time: Vec<NaiveDateTime>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Nominal model levels (hPa), top of atmosphere first.
    pub lev: Vec<f64>,
    pub hyam: Vec<f64>,
    pub hybm: Vec<f64>,
    #[serde(rename = "P0")]
    pub p0: f64,
}

impl CaseCoordinates {
    pub const FILE_NAME: &'static str = "coords.json";

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::open_failed(format!("{}: {}", path.display(), e)))?;
        let coords: Self = serde_json::from_str(&content)?;
        coords.validate()?;
        Ok(coords)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.hyam.len() != self.lev.len() || self.hybm.len() != self.lev.len() {
            return Err(StoreError::invalid_metadata(format!(
                "hybrid coefficients ({}, {}) do not match {} levels",
                self.hyam.len(),
                self.hybm.len(),
                self.lev.len()
            )));
        }
        Ok(())
    }

    /// Indices of levels at or below the `floor_hpa` pressure level.
    pub fn levels_below(&self, floor_hpa: f64) -> Vec<usize> {
        self.lev
            .iter()
            .enumerate()
            .filter(|(_, lev)| **lev >= floor_hpa)
            .map(|(k, _)| k)
            .collect()
    }
}

/// [`ModelSource`] backed by one Zarr array per variable.
pub struct ZarrModelSource {
    dir: PathBuf,
    grid: LatLonGrid,
    time: TimeAxis,
    levels: Vec<f64>,
    hybrid: HybridCoefficients,
    kept_levels: Vec<usize>,
    total_levels: usize,
}

impl ZarrModelSource {
    /// Open a case directory, keeping levels at or below `level_floor_hpa`.
    pub fn open(dir: &Path, level_floor_hpa: f64) -> Result<Self> {
        let coords = CaseCoordinates::load(&dir.join(CaseCoordinates::FILE_NAME))?;

        let kept_levels = coords.levels_below(level_floor_hpa);
        if kept_levels.is_empty() {
            return Err(StoreError::ConfigError(format!(
                "no model level at or below {} hPa",
                level_floor_hpa
            )));
        }

        let grid = LatLonGrid::new(coords.lat.clone(), coords.lon.clone())?;
        let time = TimeAxis::new(coords.time.clone())?;
        let hybrid = HybridCoefficients {
            hyam: coords.hyam.clone(),
            hybm: coords.hybm.clone(),
            p0: coords.p0,
        }
        .select(&kept_levels);
        let levels = kept_levels.iter().map(|&k| coords.lev[k]).collect();

        info!(
            dir = %dir.display(),
            nt = time.len(),
            nlat = grid.nlat(),
            nlon = grid.nlon(),
            levels = kept_levels.len(),
            "Opened model history"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            grid,
            time,
            levels,
            hybrid,
            kept_levels,
            total_levels: coords.lev.len(),
        })
    }

    fn variable_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.zarr", name))
    }

    fn open_variable(&self, name: &str) -> Result<FieldReader> {
        let path = self.variable_path(name);
        if !array_exists(&path) {
            return Err(StoreError::missing_variable(name));
        }
        debug!(variable = name, path = %path.display(), "Reading variable");
        FieldReader::open(&path)
    }

    fn check_horizontal(&self, name: &str, nt: usize, nlat: usize, nlon: usize) -> Result<()> {
        let expected = (self.time.len(), self.grid.nlat(), self.grid.nlon());
        if (nt, nlat, nlon) != expected {
            return Err(TcError::shape_mismatch(
                name,
                expected.0 * expected.1 * expected.2,
                nt * nlat * nlon,
            )
            .into());
        }
        Ok(())
    }
}

impl ModelSource for ZarrModelSource {
    fn grid(&self) -> &LatLonGrid {
        &self.grid
    }

    fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    fn levels(&self) -> &[f64] {
        &self.levels
    }

    fn hybrid(&self) -> &HybridCoefficients {
        &self.hybrid
    }

    fn has_variable(&self, name: &str) -> bool {
        array_exists(&self.variable_path(name))
    }

    fn read_field3(&self, name: &str) -> Result<Field3> {
        let field = self.open_variable(name)?.read_field3()?;
        self.check_horizontal(name, field.nt, field.nlat, field.nlon)?;
        Ok(field)
    }

    fn read_field4(&self, name: &str) -> Result<Field4> {
        let field = self.open_variable(name)?.read_field4()?;
        self.check_horizontal(name, field.nt, field.nlat, field.nlon)?;
        if field.nlev != self.total_levels {
            return Err(TcError::shape_mismatch(
                format!("{} levels", name),
                self.total_levels,
                field.nlev,
            )
            .into());
        }
        if self.kept_levels.len() == self.total_levels {
            return Ok(field);
        }
        Ok(field.select_levels(&self.kept_levels)?)
    }
}

/// [`ModelSource`] holding fields in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    grid: LatLonGrid,
    time: TimeAxis,
    levels: Vec<f64>,
    hybrid: HybridCoefficients,
    fields3: HashMap<String, Field3>,
    fields4: HashMap<String, Field4>,
}

impl MemorySource {
    pub fn new(
        grid: LatLonGrid,
        time: TimeAxis,
        levels: Vec<f64>,
        hybrid: HybridCoefficients,
    ) -> Self {
        Self {
            grid,
            time,
            levels,
            hybrid,
            fields3: HashMap::new(),
            fields4: HashMap::new(),
        }
    }

    pub fn with_field3(mut self, name: &str, field: Field3) -> Self {
        self.fields3.insert(name.to_string(), field);
        self
    }

    pub fn with_field4(mut self, name: &str, field: Field4) -> Self {
        self.fields4.insert(name.to_string(), field);
        self
    }
}

impl ModelSource for MemorySource {
    fn grid(&self) -> &LatLonGrid {
        &self.grid
    }

    fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    fn levels(&self) -> &[f64] {
        &self.levels
    }

    fn hybrid(&self) -> &HybridCoefficients {
        &self.hybrid
    }

    fn has_variable(&self, name: &str) -> bool {
        self.fields3.contains_key(name) || self.fields4.contains_key(name)
    }

    fn read_field3(&self, name: &str) -> Result<Field3> {
        self.fields3
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::missing_variable(name))
    }

    fn read_field4(&self, name: &str) -> Result<Field4> {
        self.fields4
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::missing_variable(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> CaseCoordinates {
        CaseCoordinates {
            time: vec![],
            lat: vec![0.0],
            lon: vec![0.0],
            lev: vec![3.6, 150.0, 200.0, 500.0, 992.5],
            hyam: vec![0.0; 5],
            hybm: vec![0.0; 5],
            p0: 100000.0,
        }
    }

    #[test]
    fn test_levels_below_floor() {
        assert_eq!(coords().levels_below(200.0), vec![2, 3, 4]);
        assert_eq!(coords().levels_below(0.0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_validate_rejects_short_coefficients() {
        let mut c = coords();
        c.hybm.pop();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_first_available() {
        let grid = LatLonGrid::new(vec![0.0], vec![0.0]).unwrap();
        let hybrid = HybridCoefficients {
            hyam: vec![],
            hybm: vec![],
            p0: 100000.0,
        };
        let source = MemorySource::new(grid, TimeAxis::new(vec![]).unwrap(), vec![], hybrid)
            .with_field3(vars::TS, Field3::filled(0, 1, 1, 0.0));

        assert_eq!(source.first_available(&[vars::SST, vars::TS]), Some(vars::TS));
        assert_eq!(source.first_available(&[vars::SST]), None);
        assert!(matches!(
            source.read_field3(vars::SST),
            Err(StoreError::MissingVariable(_))
        ));
    }
}
