//! Lifetime and SST genesis filter.
//!
//! A storm qualifies when it lasts at least [`MIN_LIFETIME_STEPS`] steps and
//! at least one tracked position lies over water at or above
//! [`SST_THRESHOLD_K`]. Positions are examined in file order and the scan
//! stops at the first warm one.

use std::io::BufRead;

use tc_common::{Field3, LatLonGrid, TcError};
use tracing::{debug, info};

use crate::error::{Result, TrackError};
use crate::groups::{TrackGroup, TrackGroups};
use crate::record::{StormHeader, TrackPosition};

/// Minimum storm duration in time steps.
pub const MIN_LIFETIME_STEPS: u32 = 36;

/// Sea-surface temperature a track must touch, 26 °C.
pub const SST_THRESHOLD_K: f32 = 299.15;

/// A storm that passed the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedStorm {
    pub id: u32,
    pub lifetime: u32,
}

/// Applies the filter against one SST (or skin temperature) field.
pub struct GenesisFilter<'a> {
    sst: &'a Field3,
    grid: &'a LatLonGrid,
}

impl<'a> GenesisFilter<'a> {
    pub fn new(sst: &'a Field3, grid: &'a LatLonGrid) -> Result<Self> {
        if (sst.nlat, sst.nlon) != (grid.nlat(), grid.nlon()) {
            return Err(TcError::invalid_grid(format!(
                "SST is {}x{} but the grid is {}x{}",
                sst.nlat,
                sst.nlon,
                grid.nlat(),
                grid.nlon()
            ))
            .into());
        }
        Ok(Self { sst, grid })
    }

    /// Decide one storm group. `Ok(None)` is a rejection.
    pub fn qualify(&self, group: &TrackGroup) -> Result<Option<QualifiedStorm>> {
        let storm_line = group.storm_line().ok_or_else(|| {
            TrackError::malformed(group.marker.number, "marker without a storm line")
        })?;
        let header = StormHeader::parse(storm_line)?;

        if header.lifetime < MIN_LIFETIME_STEPS {
            debug!(storm_id = header.id, lifetime = header.lifetime, "Rejected: too short");
            return Ok(None);
        }

        for line in group.position_lines() {
            let idx = TrackPosition::parse(line)?.to_grid_index(header.id, self.grid, self.sst.nt)?;
            let sst = self.sst.get(idx.t, idx.j, idx.i).unwrap_or(f32::NAN);
            if sst >= SST_THRESHOLD_K {
                debug!(storm_id = header.id, t = idx.t, j = idx.j, i = idx.i, sst, "Warm position");
                return Ok(Some(QualifiedStorm {
                    id: header.id,
                    lifetime: header.lifetime,
                }));
            }
        }

        debug!(storm_id = header.id, "Rejected: never over warm water");
        Ok(None)
    }

    /// Run every group of a track file through the filter, in file order.
    pub fn scan<R: BufRead>(&self, reader: R) -> Result<Vec<QualifiedStorm>> {
        let mut storms = Vec::new();
        let mut groups = 0usize;
        for group in TrackGroups::new(reader) {
            groups += 1;
            if let Some(storm) = self.qualify(&group?)? {
                info!(storm_id = storm.id, lifetime = storm.lifetime, "TC accepted");
                storms.push(storm);
            }
        }
        info!(groups, accepted = storms.len(), "Track file scanned");
        Ok(storms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_utils::{band_grid, track_file, StormTrack};

    fn warm_at(grid: &LatLonGrid, nt: usize, cells: &[(usize, usize, usize)]) -> Field3 {
        let mut sst = Field3::filled(nt, grid.nlat(), grid.nlon(), 290.0);
        for &(t, j, i) in cells {
            let idx = sst.index(t, j, i);
            sst.data[idx] = 300.0;
        }
        sst
    }

    fn scan(storms: &[StormTrack], sst: &Field3, grid: &LatLonGrid) -> Result<Vec<QualifiedStorm>> {
        GenesisFilter::new(sst, grid)
            .unwrap()
            .scan(Cursor::new(track_file(storms)))
    }

    #[test]
    fn test_lifetime_boundary() {
        let grid = band_grid(0.0, 1.0, 4, 6);
        let sst = warm_at(&grid, 2, &[(0, 1, 2)]);
        let storms = [
            StormTrack::new(1, 36).at_cell(0, 1, 2),
            StormTrack::new(2, 35).at_cell(0, 1, 2),
        ];
        assert_eq!(
            scan(&storms, &sst, &grid).unwrap(),
            vec![QualifiedStorm { id: 1, lifetime: 36 }]
        );
    }

    #[test]
    fn test_first_warm_position_short_circuits() {
        let grid = band_grid(0.0, 1.0, 4, 6);
        let sst = warm_at(&grid, 2, &[(0, 1, 2)]);
        let storm = StormTrack::new(3, 40)
            .at_cell(0, 1, 2)
            .at(0, 99.0, 99.0)
            .at(7, 1.0, 1.0);
        assert_eq!(
            scan(&[storm], &sst, &grid).unwrap(),
            vec![QualifiedStorm { id: 3, lifetime: 40 }]
        );
    }

    #[test]
    fn test_out_of_range_before_warm_position_is_fatal() {
        let grid = band_grid(0.0, 1.0, 4, 6);
        let sst = warm_at(&grid, 2, &[(0, 1, 2)]);
        let storm = StormTrack::new(3, 40).at(0, 99.0, 99.0).at_cell(0, 1, 2);
        assert!(matches!(
            scan(&[storm], &sst, &grid),
            Err(TrackError::IndexOutOfBounds { storm_id: 3, line: 3, .. })
        ));
    }

    #[test]
    fn test_cold_and_missing_sst_reject() {
        let grid = band_grid(0.0, 1.0, 4, 6);
        let mut sst = warm_at(&grid, 1, &[]);
        let idx = sst.index(0, 0, 0);
        sst.data[idx] = tc_common::MISSING_VALUE;
        let storm = StormTrack::new(4, 50).at_cell(0, 0, 0).at_cell(0, 3, 5);
        assert!(scan(&[storm], &sst, &grid).unwrap().is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let grid = band_grid(0.0, 1.0, 2, 2);
        let sst = Field3::filled(1, 2, 2, SST_THRESHOLD_K);
        let storm = StormTrack::new(6, 36).at_cell(0, 1, 1);
        assert_eq!(scan(&[storm], &sst, &grid).unwrap().len(), 1);
    }

    #[test]
    fn test_sst_shape_must_match_grid() {
        let grid = band_grid(0.0, 1.0, 4, 6);
        let sst = Field3::filled(1, 3, 6, 300.0);
        assert!(GenesisFilter::new(&sst, &grid).is_err());
    }
}
