//! GrADS control file describing the raw label mask.

use tc_common::{LatLonGrid, TimeAxis, MISSING_VALUE};

use crate::report::decimal;

/// Data file the descriptor points at.
pub const MASK_FILE: &str = "irt_tracks_mask.dat";

/// Contents of `irt_tracks_mask.ctl`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradsDescriptor {
    pub nx: usize,
    pub ny: usize,
    pub nt: usize,
    pub lon0: f64,
    pub dlon: f64,
    pub lat0: f64,
    pub dlat: f64,
    /// Nominal level reported in `ZDEF` (the lowest model level).
    pub level: f64,
    /// `HH:MMZddMonYYYY`.
    pub start: String,
    /// `1hr`, `6hr`, `1dy`, ...
    pub increment: String,
}

impl GradsDescriptor {
    /// Describe `time.len()` steps on `grid`.
    pub fn new(grid: &LatLonGrid, time: &TimeAxis, level: f64) -> Self {
        Self {
            nx: grid.nlon(),
            ny: grid.nlat(),
            nt: time.len(),
            lon0: grid.lon.first().copied().unwrap_or_default(),
            dlon: grid.lon_step(),
            lat0: grid.lat.first().copied().unwrap_or_default(),
            dlat: grid.lat_step(),
            level,
            start: time.grads_start().unwrap_or_default(),
            increment: time.grads_increment(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "DSET ^{mask}\n\
             OPTIONS 365_day_calendar\n\
             UNDEF {undef:e}\n\
             XDEF {nx} LINEAR {lon0} {dlon}\n\
             YDEF {ny} LINEAR {lat0} {dlat}\n\
             ZDEF 1 levels {level}\n\
             TDEF {nt} LINEAR {start} {increment}\n\
             VARS 1\n\
             obj 0 t,y,x TC-like object ID\n\
             ENDVARS\n",
            mask = MASK_FILE,
            undef = MISSING_VALUE,
            nx = self.nx,
            lon0 = decimal(self.lon0),
            dlon = decimal(self.dlon),
            ny = self.ny,
            lat0 = decimal(self.lat0),
            dlat = decimal(self.dlat),
            level = decimal(self.level),
            nt = self.nt,
            start = self.start,
            increment = self.increment,
        )
    }
}
