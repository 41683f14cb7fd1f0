//! Raw tracker mask and the accumulated label volume.
//!
//! The tracker writes its mask as a flat run of native-endian `f32` storm
//! ids, one per `(time, lat, lon)` cell in row-major order, 0 meaning no
//! storm. Qualifying ids are copied into a [`LabelVolume`] of the same
//! length; everything else stays 0.

use std::path::Path;

use rayon::prelude::*;
use tc_common::{Field3, LatLonGrid};
use tracing::{debug, info};

use crate::error::{LabelError, Result};

/// The tracker's per-cell storm ids.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMask {
    pub data: Vec<f32>,
}

impl RawMask {
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Read a mask file.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| LabelError::io(path, e))?;
        if bytes.len() % std::mem::size_of::<f32>() != 0 {
            return Err(LabelError::shape_mismatch(format!(
                "{} is {} bytes, not a whole number of f32 values",
                path.display(),
                bytes.len()
            )));
        }
        let data: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
        info!(path = %path.display(), values = data.len(), "Read raw mask");
        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of time steps the mask covers on `grid`.
    pub fn steps(&self, grid: &LatLonGrid) -> Result<usize> {
        steps_for(self.len(), grid)
    }
}

fn steps_for(len: usize, grid: &LatLonGrid) -> Result<usize> {
    let cells = grid.len();
    if cells == 0 || len % cells != 0 {
        return Err(LabelError::MaskSize { len, cells });
    }
    Ok(len / cells)
}

/// Output labels, accumulated one qualifying storm at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVolume {
    data: Vec<f32>,
}

impl LabelVolume {
    /// An all-zero volume matching `mask`.
    pub fn for_mask(mask: &RawMask) -> Self {
        Self {
            data: vec![0.0; mask.len()],
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Copy `id` into every cell where `mask` holds `id`, leaving other cells
    /// untouched. Returns the number of cells labeled.
    pub fn stamp(&mut self, id: u32, mask: &RawMask) -> Result<usize> {
        if mask.len() != self.data.len() {
            return Err(LabelError::shape_mismatch(format!(
                "mask has {} values but the label volume has {}",
                mask.len(),
                self.data.len()
            )));
        }

        let label = id as f32;
        let stamped = self
            .data
            .par_iter_mut()
            .zip(mask.data.par_iter())
            .map(|(out, &raw)| {
                if raw == label {
                    *out = label;
                    1usize
                } else {
                    0
                }
            })
            .sum();
        debug!(storm_id = id, cells = stamped, "Stamped storm");
        Ok(stamped)
    }

    /// Reshape to `(time, lat, lon)` on `grid`.
    pub fn into_field3(self, grid: &LatLonGrid) -> Result<Field3> {
        let nt = steps_for(self.data.len(), grid)?;
        Ok(Field3::new(nt, grid.nlat(), grid.nlon(), self.data)?)
    }
}
