//! Relative vorticity from horizontal winds.
//!
//! The per-level computation is delegated to a [`VorticityOperator`]. The
//! [`VorticityEngine`] owns everything around it: level selection, axis
//! reordering, latitude orientation and the per-time-step worker pool.

mod engine;
mod finite_difference;

pub use engine::VorticityEngine;
pub use finite_difference::{FiniteDifferenceVorticity, EARTH_RADIUS};

use tc_common::{LatLonGrid, LatOrder};

use crate::error::Result;

/// Computes relative vorticity for one time step.
///
/// Winds are laid out `(lat, lon, lev)`, latitude in the order returned by
/// [`VorticityOperator::lat_order`]. The result uses the same layout.
pub trait VorticityOperator: Send + Sync {
    /// Latitude orientation the operator expects.
    fn lat_order(&self) -> LatOrder;

    fn vorticity(&self, grid: &LatLonGrid, u: &[f32], v: &[f32], nlev: usize) -> Result<Vec<f32>>;
}
