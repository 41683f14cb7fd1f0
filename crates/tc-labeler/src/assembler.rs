//! Labeling of one case's tracker output and assembly of its result files.
//!
//! Inputs, read from the case's output directory:
//! - `irt_tracks_output.txt`: the tracker's storm groups
//! - `irt_tracks_mask.dat`: the tracker's raw per-cell storm ids
//!
//! Outputs, written next to them:
//! - `TC.zarr`: labels of the accepted storms, `(time, lat, lon)`
//! - `TC.txt`: storm count and mean lifetime
//! - `irt_tracks_mask.ctl`: GrADS descriptor for the raw mask

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use grid_store::{FieldMetadata, FieldWriter, StoreConfig};
use tc_common::{Field3, LatLonGrid, TimeAxis};
use tracing::info;
use track_parser::GenesisFilter;

use crate::descriptor::{GradsDescriptor, MASK_FILE};
use crate::error::{LabelError, Result};
use crate::mask::{LabelVolume, RawMask};
use crate::report::Summary;

pub const TRACK_FILE: &str = "irt_tracks_output.txt";
pub const LABEL_STORE: &str = "TC.zarr";
pub const SUMMARY_FILE: &str = "TC.txt";
pub const DESCRIPTOR_FILE: &str = "irt_tracks_mask.ctl";

/// Name of the label variable.
pub const LABEL_VARIABLE: &str = "TC";

/// Everything produced for one case.
#[derive(Debug, Clone)]
pub struct LabeledCase {
    pub labels: Field3,
    pub summary: Summary,
    pub label_path: PathBuf,
    pub summary_path: PathBuf,
    pub descriptor_path: PathBuf,
}

/// Writes the label volume, summary and descriptor of a case.
pub struct OutputAssembler {
    dir: PathBuf,
    writer: FieldWriter,
}

impl OutputAssembler {
    pub fn new(dir: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            dir: dir.into(),
            writer: FieldWriter::new(config),
        }
    }

    /// Reshape `volume` onto `grid`, cut `time` to its length and write all
    /// three outputs. `level` is the nominal level reported in the
    /// descriptor.
    pub fn assemble(
        &self,
        volume: LabelVolume,
        grid: &LatLonGrid,
        time: &TimeAxis,
        level: f64,
        summary: Summary,
    ) -> Result<LabeledCase> {
        let labels = volume.into_field3(grid)?;
        let time = time.truncated(labels.nt)?;

        let label_path = self.dir.join(LABEL_STORE);
        let metadata = FieldMetadata::new(LABEL_VARIABLE, grid, &time)
            .with_units("#")
            .with_long_name("TC ID");
        self.writer.write_field3(&label_path, &labels, &metadata)?;

        let summary_path = self.dir.join(SUMMARY_FILE);
        std::fs::write(&summary_path, summary.render())
            .map_err(|e| LabelError::io(&summary_path, e))?;

        let descriptor_path = self.dir.join(DESCRIPTOR_FILE);
        std::fs::write(
            &descriptor_path,
            GradsDescriptor::new(grid, &time, level).render(),
        )
        .map_err(|e| LabelError::io(&descriptor_path, e))?;

        info!(
            dir = %self.dir.display(),
            steps = labels.nt,
            storms = summary.total,
            "Wrote labeled output"
        );

        Ok(LabeledCase {
            labels,
            summary,
            label_path,
            summary_path,
            descriptor_path,
        })
    }
}

/// The label stage for one case.
pub struct LabelJob<'a> {
    /// Directory holding the tracker output; results are written here too.
    pub dir: &'a Path,
    pub grid: &'a LatLonGrid,
    pub time: &'a TimeAxis,
    /// SST or skin temperature on `grid`.
    pub sst: &'a Field3,
    /// Nominal lowest model level.
    pub level: f64,
}

impl LabelJob<'_> {
    /// Filter the tracked storms, label the accepted ones and write the
    /// outputs.
    pub fn run(&self, config: StoreConfig) -> Result<LabeledCase> {
        let mask = RawMask::read(&self.dir.join(MASK_FILE))?;
        let steps = mask.steps(self.grid)?;
        if steps > self.time.len() {
            return Err(LabelError::shape_mismatch(format!(
                "mask covers {} steps but the case has {}",
                steps,
                self.time.len()
            )));
        }

        let track_path = self.dir.join(TRACK_FILE);
        let tracks = File::open(&track_path).map_err(|e| LabelError::io(&track_path, e))?;
        let storms = GenesisFilter::new(self.sst, self.grid)?.scan(BufReader::new(tracks))?;

        let mut volume = LabelVolume::for_mask(&mask);
        let mut summary = Summary::default();
        for storm in &storms {
            volume.stamp(storm.id, &mask)?;
            summary.add(storm);
        }

        OutputAssembler::new(self.dir, config).assemble(
            volume,
            self.grid,
            self.time,
            self.level,
            summary,
        )
    }
}
