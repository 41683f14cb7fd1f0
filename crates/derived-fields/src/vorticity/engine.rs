//! Per-time-step vorticity on a dedicated worker pool.

use std::ops::RangeInclusive;

use rayon::prelude::*;
use tc_common::{Field3, Field4, LatLonGrid, MISSING_VALUE};
use tracing::{debug, info};

use super::{FiniteDifferenceVorticity, VorticityOperator};
use crate::config::DiagnosticsConfig;
use crate::error::{DerivedFieldError, Result};
use crate::vertical::{bracketing_levels, interpolate_to_level};

/// Runs a [`VorticityOperator`] over every time step of a wind field.
///
/// Each time step is an independent task on a bounded pool. Results are
/// written back by time index, and the first failing step aborts the
/// whole computation.
pub struct VorticityEngine {
    operator: Box<dyn VorticityOperator>,
    pool: rayon::ThreadPool,
}

impl VorticityEngine {
    pub fn new(operator: impl VorticityOperator + 'static, workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("vorticity-{}", i))
            .build()
            .map_err(|e| DerivedFieldError::WorkerPool(e.to_string()))?;

        Ok(Self {
            operator: Box::new(operator),
            pool,
        })
    }

    /// Finite-difference engine sized from `config`.
    pub fn from_config(config: &DiagnosticsConfig) -> Result<Self> {
        Self::new(FiniteDifferenceVorticity::default(), config.worker_count())
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Vorticity on every level of `u` and `v`.
    pub fn relative_vorticity(&self, grid: &LatLonGrid, u: &Field4, v: &Field4) -> Result<Field4> {
        if u.shape() != v.shape() {
            return Err(DerivedFieldError::invalid_input(format!(
                "U shape {:?} does not match V shape {:?}",
                u.shape(),
                v.shape()
            )));
        }
        if (u.nlat, u.nlon) != (grid.nlat(), grid.nlon()) {
            return Err(DerivedFieldError::invalid_input(format!(
                "winds are {}x{}, grid is {}x{}",
                u.nlat,
                u.nlon,
                grid.nlat(),
                grid.nlon()
            )));
        }

        let flip = grid.lat_order() != self.operator.lat_order();
        let op_grid = if flip {
            grid.with_reversed_lat()
        } else {
            grid.clone()
        };
        let [nt, nlev, nlat, nlon] = u.shape();
        let step_len = u.step_len();

        debug!(
            steps = nt,
            levels = nlev,
            workers = self.workers(),
            flip_lat = flip,
            "Computing relative vorticity"
        );

        let operator = self.operator.as_ref();
        let results: Vec<(usize, Vec<f32>)> = self.pool.install(|| {
            (0..nt)
                .into_par_iter()
                .map(|t| {
                    let us = to_lat_lon_lev(u.step(t), nlev, nlat, nlon, flip);
                    let vs = to_lat_lon_lev(v.step(t), nlev, nlat, nlon, flip);
                    let zeta = operator
                        .vorticity(&op_grid, &us, &vs, nlev)
                        .map_err(|e| DerivedFieldError::task_failed(t, e.to_string()))?;
                    if zeta.len() != step_len {
                        return Err(DerivedFieldError::task_failed(
                            t,
                            format!("operator returned {} values, expected {}", zeta.len(), step_len),
                        ));
                    }
                    Ok((t, from_lat_lon_lev(&zeta, nlev, nlat, nlon, flip)))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut data = vec![MISSING_VALUE; nt * step_len];
        for (t, slab) in results {
            data[t * step_len..(t + 1) * step_len].copy_from_slice(&slab);
        }

        Ok(Field4::new(nt, nlev, nlat, nlon, data)?)
    }

    /// Vorticity interpolated to `target` Pa.
    ///
    /// Only the levels bracketing `target` in some column are differentiated.
    pub fn vorticity_at_pressure(
        &self,
        grid: &LatLonGrid,
        u: &Field4,
        v: &Field4,
        pres: &Field4,
        target: f64,
    ) -> Result<Field3> {
        let levels: RangeInclusive<usize> = bracketing_levels(pres, target).ok_or_else(|| {
            DerivedFieldError::invalid_input("pressure field has no levels to bracket")
        })?;
        info!(
            target_pa = target,
            first_level = levels.start(),
            last_level = levels.end(),
            "Computing vorticity on bracketing levels"
        );

        let u = u.level_range(levels.clone())?;
        let v = v.level_range(levels.clone())?;
        let pres = pres.level_range(levels)?;

        let zeta = self.relative_vorticity(grid, &u, &v)?;
        interpolate_to_level(&zeta, &pres, target)
    }
}

/// `(lev, lat, lon)` to `(lat, lon, lev)`, optionally reversing latitude.
fn to_lat_lon_lev(step: &[f32], nlev: usize, nlat: usize, nlon: usize, flip: bool) -> Vec<f32> {
    let mut out = vec![0.0; step.len()];
    for k in 0..nlev {
        for j in 0..nlat {
            let jj = if flip { nlat - 1 - j } else { j };
            for i in 0..nlon {
                out[(jj * nlon + i) * nlev + k] = step[(k * nlat + j) * nlon + i];
            }
        }
    }
    out
}

/// Inverse of [`to_lat_lon_lev`].
fn from_lat_lon_lev(data: &[f32], nlev: usize, nlat: usize, nlon: usize, flip: bool) -> Vec<f32> {
    let mut out = vec![0.0; data.len()];
    for k in 0..nlev {
        for j in 0..nlat {
            let jj = if flip { nlat - 1 - j } else { j };
            for i in 0..nlon {
                out[(k * nlat + j) * nlon + i] = data[(jj * nlon + i) * nlev + k];
            }
        }
    }
    out
}
