//! Horizontal grid specification for regular lat/lon model output.

use serde::{Deserialize, Serialize};

use crate::error::{TcError, TcResult};

/// Sentinel stored wherever a value is undefined (e.g. below ground).
///
/// Matches the `UNDEF` entry written to GrADS descriptor files.
pub const MISSING_VALUE: f32 = -9.99e8;

/// Returns true if `v` is the missing sentinel (or NaN).
#[inline]
pub fn is_missing(v: f32) -> bool {
    v.is_nan() || v == MISSING_VALUE
}

/// Direction of the latitude axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatOrder {
    /// Row 0 is the southernmost latitude.
    SouthToNorth,
    /// Row 0 is the northernmost latitude.
    NorthToSouth,
}

impl LatOrder {
    /// Detect the orientation of a latitude coordinate.
    ///
    /// A single-row axis is treated as south-to-north.
    pub fn of(lat: &[f64]) -> Self {
        match (lat.first(), lat.last()) {
            (Some(first), Some(last)) if first > last => Self::NorthToSouth,
            _ => Self::SouthToNorth,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::SouthToNorth => Self::NorthToSouth,
            Self::NorthToSouth => Self::SouthToNorth,
        }
    }
}

/// A regular latitude/longitude grid.
///
/// Longitudes are periodic: column `nlon` is column `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLonGrid {
    /// Latitudes in degrees, either ascending or descending.
    pub lat: Vec<f64>,
    /// Longitudes in degrees, ascending.
    pub lon: Vec<f64>,
}

impl LatLonGrid {
    /// Create a grid, checking that both axes are non-empty and strictly
    /// monotonic.
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> TcResult<Self> {
        if lat.is_empty() || lon.is_empty() {
            return Err(TcError::invalid_grid("latitude and longitude must be non-empty"));
        }
        if !strictly_monotonic(&lat) {
            return Err(TcError::invalid_grid("latitude is not strictly monotonic"));
        }
        if !lon.windows(2).all(|w| w[1] > w[0]) {
            return Err(TcError::invalid_grid("longitude is not strictly ascending"));
        }
        Ok(Self { lat, lon })
    }

    pub fn nlat(&self) -> usize {
        self.lat.len()
    }

    pub fn nlon(&self) -> usize {
        self.lon.len()
    }

    /// Number of horizontal cells.
    pub fn len(&self) -> usize {
        self.nlat() * self.nlon()
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty() || self.lon.is_empty()
    }

    pub fn lat_order(&self) -> LatOrder {
        LatOrder::of(&self.lat)
    }

    /// Signed latitude spacing between the first two rows.
    pub fn lat_step(&self) -> f64 {
        axis_step(&self.lat)
    }

    /// Signed longitude spacing between the first two columns.
    pub fn lon_step(&self) -> f64 {
        axis_step(&self.lon)
    }

    /// True when the longitude axis closes on itself, `nlon * dlon = 360`.
    pub fn is_global_lon(&self) -> bool {
        let dlon = self.lon_step().abs();
        dlon > 0.0 && (self.nlon() as f64 * dlon - 360.0).abs() < GLOBAL_LON_TOLERANCE
    }

    /// True when both ends of the latitude axis lie within one increment of
    /// a pole, i.e. the grid already spans pole to pole.
    pub fn reaches_poles(&self) -> bool {
        let inc = self.lat_step().abs();
        let near_pole = |lat: f64| lat - inc < -90.0 || lat + inc > 90.0;
        match (self.lat.first(), self.lat.last()) {
            (Some(&first), Some(&last)) => near_pole(first) && near_pole(last),
            _ => false,
        }
    }

    /// Flat index of horizontal cell `(j, i)` in a row-major `(lat, lon)` slab.
    #[inline]
    pub fn flat_index(&self, j: usize, i: usize) -> usize {
        j * self.nlon() + i
    }

    /// Wrap a longitude index that overshoots the domain by at most one
    /// period. Values in `[nlon, 2 * nlon)` map to `[0, nlon)`; anything else
    /// is returned unchanged so the caller can bounds-check it.
    #[inline]
    pub fn wrap_lon_index(&self, x: i64) -> i64 {
        let nlon = self.nlon() as i64;
        if x >= nlon {
            x - nlon
        } else {
            x
        }
    }

    /// Row indices lying in the southern hemisphere.
    pub fn southern_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.lat
            .iter()
            .enumerate()
            .filter(|(_, lat)| **lat < 0.0)
            .map(|(j, _)| j)
    }

    /// The same grid with the latitude axis reversed.
    pub fn with_reversed_lat(&self) -> Self {
        let mut lat = self.lat.clone();
        lat.reverse();
        Self {
            lat,
            lon: self.lon.clone(),
        }
    }
}

/// Degrees of slack allowed when deciding whether longitudes span the globe.
const GLOBAL_LON_TOLERANCE: f64 = 1e-3;

fn axis_step(axis: &[f64]) -> f64 {
    if axis.len() < 2 {
        0.0
    } else {
        axis[1] - axis[0]
    }
}

fn strictly_monotonic(axis: &[f64]) -> bool {
    axis.windows(2).all(|w| w[1] > w[0]) || axis.windows(2).all(|w| w[1] < w[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam_like(nlat: usize, nlon: usize) -> LatLonGrid {
        let dlat = 180.0 / (nlat - 1) as f64;
        let dlon = 360.0 / nlon as f64;
        LatLonGrid::new(
            (0..nlat).map(|j| -90.0 + j as f64 * dlat).collect(),
            (0..nlon).map(|i| i as f64 * dlon).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_lat_order_detection() {
        assert_eq!(LatOrder::of(&[-10.0, 0.0, 10.0]), LatOrder::SouthToNorth);
        assert_eq!(LatOrder::of(&[10.0, 0.0, -10.0]), LatOrder::NorthToSouth);
        assert_eq!(LatOrder::of(&[5.0]), LatOrder::SouthToNorth);
        assert_eq!(LatOrder::SouthToNorth.reversed(), LatOrder::NorthToSouth);
    }

    #[test]
    fn test_rejects_non_monotonic_axes() {
        assert!(LatLonGrid::new(vec![0.0, 1.0, 0.5], vec![0.0, 1.0]).is_err());
        assert!(LatLonGrid::new(vec![0.0, 1.0], vec![1.0, 0.0]).is_err());
        assert!(LatLonGrid::new(vec![], vec![0.0]).is_err());
    }

    #[test]
    fn test_global_longitude_detection() {
        assert!(cam_like(5, 8).is_global_lon());
        assert!(cam_like(5, 288).is_global_lon());
        let regional = LatLonGrid::new(vec![0.0, 1.0], vec![100.0, 110.0, 120.0]).unwrap();
        assert!(!regional.is_global_lon());
        let single = LatLonGrid::new(vec![0.0, 1.0], vec![100.0]).unwrap();
        assert!(!single.is_global_lon());
    }

    #[test]
    fn test_wrap_lon_index_subtracts_one_period() {
        let grid = cam_like(192, 288);
        for x in 288..576 {
            let wrapped = grid.wrap_lon_index(x);
            assert_eq!(wrapped, x - 288);
            assert!((0..288).contains(&wrapped));
        }
        assert_eq!(grid.wrap_lon_index(17), 17);
        assert_eq!(grid.wrap_lon_index(-1), -1);
        assert_eq!(grid.wrap_lon_index(600), 312);
    }

    #[test]
    fn test_reaches_poles() {
        assert!(cam_like(192, 288).reaches_poles());

        let tropics = LatLonGrid::new(vec![-30.0, 0.0, 30.0], vec![0.0, 90.0]).unwrap();
        assert!(!tropics.reaches_poles());
    }

    #[test]
    fn test_southern_rows_and_reversal() {
        let grid = LatLonGrid::new(vec![-20.0, -10.0, 0.0, 10.0], vec![0.0, 1.0]).unwrap();
        assert_eq!(grid.southern_rows().collect::<Vec<_>>(), vec![0, 1]);

        let reversed = grid.with_reversed_lat();
        assert_eq!(reversed.lat_order(), LatOrder::NorthToSouth);
        assert_eq!(reversed.southern_rows().collect::<Vec<_>>(), vec![2, 3]);
    }
}
