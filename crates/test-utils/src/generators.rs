//! Test data generators for synthetic model cases.
//!
//! These generators create predictable, verifiable grids and fields that
//! can be used across the test suite.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use grid_store::{
    CaseCoordinates, FieldMetadata, FieldWriter, HybridCoefficients, MemorySource, StoreConfig,
};
use tc_common::{Field3, Field4, LatLonGrid, TimeAxis};

/// Reference pressure of the synthetic hybrid coordinate (Pa).
pub const P0: f64 = 100000.0;

/// Hourly time axis starting at 2000-01-01 00:00.
///
/// # Example
///
/// ```
/// use test_utils::hourly_axis;
///
/// let axis = hourly_axis(3);
/// assert_eq!(axis.len(), 3);
/// assert_eq!(axis.grads_increment(), "1hr");
/// ```
pub fn hourly_axis(n: usize) -> TimeAxis {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start date");
    TimeAxis::regular(start, Duration::hours(1), n)
}

/// Pole-to-pole grid, south to north, longitudes from 0 in `360 / nlon`
/// steps (the layout of CAM finite-volume output).
pub fn global_grid(nlat: usize, nlon: usize) -> LatLonGrid {
    let dlat = 180.0 / (nlat - 1) as f64;
    let dlon = 360.0 / nlon as f64;
    LatLonGrid::new(
        (0..nlat).map(|j| -90.0 + j as f64 * dlat).collect(),
        (0..nlon).map(|i| i as f64 * dlon).collect(),
    )
    .expect("valid global grid")
}

/// Latitude band starting at `lat0` with signed spacing `dlat`, global in
/// longitude.
pub fn band_grid(lat0: f64, dlat: f64, nlat: usize, nlon: usize) -> LatLonGrid {
    let dlon = 360.0 / nlon as f64;
    LatLonGrid::new(
        (0..nlat).map(|j| lat0 + j as f64 * dlat).collect(),
        (0..nlon).map(|i| i as f64 * dlon).collect(),
    )
    .expect("valid band grid")
}

/// Creates a field with predictable values.
///
/// Each cell value is `t * 10000 + j * 100 + i`, so a misplaced read or
/// write is easy to spot.
pub fn coded_field3(nt: usize, nlat: usize, nlon: usize) -> Field3 {
    let mut data = Vec::with_capacity(nt * nlat * nlon);
    for t in 0..nt {
        for j in 0..nlat {
            for i in 0..nlon {
                data.push((t * 10000 + j * 100 + i) as f32);
            }
        }
    }
    Field3::new(nt, nlat, nlon, data).expect("consistent shape")
}

/// A small model case on pure sigma levels.
///
/// Levels run from 100 hPa at the top to 1000 hPa at the bottom in equal
/// steps, with `hyam = 0` and `hybm = lev / 1000`, so model pressure is
/// `lev * 100 * PS / P0`.
#[derive(Debug, Clone)]
pub struct SyntheticCase {
    pub grid: LatLonGrid,
    pub time: TimeAxis,
    /// Nominal levels (hPa), top first.
    pub lev: Vec<f64>,
    pub hybrid: HybridCoefficients,
    /// Uniform surface pressure (Pa).
    pub surface_pressure: f64,
}

impl SyntheticCase {
    pub fn new(grid: LatLonGrid, nt: usize, nlev: usize) -> Self {
        let lev: Vec<f64> = (0..nlev)
            .map(|k| 100.0 + 900.0 * k as f64 / (nlev - 1).max(1) as f64)
            .collect();
        let hybrid = HybridCoefficients {
            hyam: vec![0.0; nlev],
            hybm: lev.iter().map(|l| l / 1000.0).collect(),
            p0: P0,
        };
        Self {
            grid,
            time: hourly_axis(nt),
            lev,
            hybrid,
            surface_pressure: P0,
        }
    }

    pub fn nt(&self) -> usize {
        self.time.len()
    }

    pub fn nlev(&self) -> usize {
        self.lev.len()
    }

    /// Model pressure (Pa) at level `k`.
    pub fn pressure_at(&self, k: usize) -> f64 {
        self.hybrid.hyam[k] * self.hybrid.p0 + self.hybrid.hybm[k] * self.surface_pressure
    }

    /// Single-level field from `f(t, lat, lon)`.
    pub fn field3(&self, f: impl Fn(usize, f64, f64) -> f32) -> Field3 {
        let mut data = Vec::with_capacity(self.nt() * self.grid.len());
        for t in 0..self.nt() {
            for lat in &self.grid.lat {
                for lon in &self.grid.lon {
                    data.push(f(t, *lat, *lon));
                }
            }
        }
        Field3::new(self.nt(), self.grid.nlat(), self.grid.nlon(), data)
            .expect("consistent shape")
    }

    /// Multi-level field from `f(t, pressure_pa, lat, lon)`.
    pub fn field4(&self, f: impl Fn(usize, f64, f64, f64) -> f32) -> Field4 {
        let mut data = Vec::with_capacity(self.nt() * self.nlev() * self.grid.len());
        for t in 0..self.nt() {
            for k in 0..self.nlev() {
                let p = self.pressure_at(k);
                for lat in &self.grid.lat {
                    for lon in &self.grid.lon {
                        data.push(f(t, p, *lat, *lon));
                    }
                }
            }
        }
        Field4::new(
            self.nt(),
            self.nlev(),
            self.grid.nlat(),
            self.grid.nlon(),
            data,
        )
        .expect("consistent shape")
    }

    /// Uniform surface pressure field.
    pub fn ps(&self) -> Field3 {
        let ps = self.surface_pressure as f32;
        self.field3(|_, _, _| ps)
    }

    /// In-memory source holding only `PS`.
    pub fn source(&self) -> MemorySource {
        MemorySource::new(
            self.grid.clone(),
            self.time.clone(),
            self.lev.clone(),
            self.hybrid.clone(),
        )
        .with_field3("PS", self.ps())
    }

    /// Write the case as a Zarr case directory (`coords.json` plus one
    /// store per variable, `PS` included).
    pub fn write_case_dir(&self, dir: &Path, fields3: &[(&str, &Field3)], fields4: &[(&str, &Field4)]) {
        std::fs::create_dir_all(dir).expect("create case dir");
        let coords = CaseCoordinates {
            time: self.time.times.clone(),
            lat: self.grid.lat.clone(),
            lon: self.grid.lon.clone(),
            lev: self.lev.clone(),
            hyam: self.hybrid.hyam.clone(),
            hybm: self.hybrid.hybm.clone(),
            p0: self.hybrid.p0,
        };
        coords
            .save(&dir.join(CaseCoordinates::FILE_NAME))
            .expect("write coords");

        let writer = FieldWriter::new(StoreConfig::default());
        let ps = self.ps();
        let ps_entry = ("PS", &ps);
        for (name, field) in fields3.iter().chain(std::iter::once(&ps_entry)) {
            writer
                .write_field3(
                    &dir.join(format!("{}.zarr", name)),
                    field,
                    &FieldMetadata::new(*name, &self.grid, &self.time),
                )
                .expect("write field3");
        }
        for (name, field) in fields4 {
            writer
                .write_field4(
                    &dir.join(format!("{}.zarr", name)),
                    field,
                    &FieldMetadata::new(*name, &self.grid, &self.time),
                )
                .expect("write field4");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_grid_spans_poles() {
        let grid = global_grid(19, 36);
        assert_eq!(grid.lat[0], -90.0);
        assert_eq!(grid.lat[18], 90.0);
        assert_eq!(grid.lon[1], 10.0);
        assert!(grid.reaches_poles());
    }

    #[test]
    fn test_coded_field3() {
        let f = coded_field3(2, 3, 4);
        assert_eq!(f.get(1, 2, 3), Some(10203.0));
    }

    #[test]
    fn test_synthetic_case_levels() {
        let case = SyntheticCase::new(band_grid(-10.0, 10.0, 3, 4), 2, 10);
        assert_eq!(case.lev[0], 100.0);
        assert_eq!(case.lev[9], 1000.0);
        assert!((case.pressure_at(2) - 30000.0).abs() < 1e-6);

        let p = case.field4(|_, p, _, _| p as f32);
        assert_eq!(p.get(1, 9, 2, 3), Some(100000.0));
    }
}
