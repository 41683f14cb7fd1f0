//! Centered finite-difference vorticity on a regular lat/lon grid.

use tc_common::{is_missing, LatLonGrid, LatOrder, MISSING_VALUE};

use super::VorticityOperator;
use crate::error::{DerivedFieldError, Result};

/// Mean Earth radius (m).
pub const EARTH_RADIUS: f64 = 6.3712e6;

/// Rows closer than this to a pole (degrees) are treated as pole rows.
const POLE_TOLERANCE: f64 = 1e-6;

/// `ζ = (∂v/∂λ − ∂(u cosφ)/∂φ) / (a cosφ)`
///
/// Longitude is periodic on global grids. On regional grids the first and
/// last columns use one-sided differences, as do the first and last rows for
/// the latitude derivative. Pole rows, where `cosφ = 0`,
/// take the zonal mean of the adjacent row.
#[derive(Debug, Clone)]
pub struct FiniteDifferenceVorticity {
    radius: f64,
}

impl Default for FiniteDifferenceVorticity {
    fn default() -> Self {
        Self::new(EARTH_RADIUS)
    }
}

impl FiniteDifferenceVorticity {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl VorticityOperator for FiniteDifferenceVorticity {
    fn lat_order(&self) -> LatOrder {
        LatOrder::NorthToSouth
    }

    fn vorticity(&self, grid: &LatLonGrid, u: &[f32], v: &[f32], nlev: usize) -> Result<Vec<f32>> {
        let (nlat, nlon) = (grid.nlat(), grid.nlon());
        let len = nlat * nlon * nlev;
        if u.len() != len || v.len() != len {
            return Err(DerivedFieldError::invalid_input(format!(
                "winds have {} and {} values, grid needs {}",
                u.len(),
                v.len(),
                len
            )));
        }
        if nlat < 2 || nlon < 3 {
            return Err(DerivedFieldError::invalid_input(format!(
                "grid {}x{} too small for finite differences",
                nlat, nlon
            )));
        }

        let dlam = grid.lon_step().to_radians();
        let periodic = grid.is_global_lon();
        let lon_stencil = |i: usize| -> (usize, usize, f64) {
            if periodic {
                ((i + nlon - 1) % nlon, (i + 1) % nlon, 2.0)
            } else if i == 0 {
                (0, 1, 1.0)
            } else if i == nlon - 1 {
                (nlon - 2, nlon - 1, 1.0)
            } else {
                (i - 1, i + 1, 2.0)
            }
        };
        let phi: Vec<f64> = grid.lat.iter().map(|lat| lat.to_radians()).collect();
        let cos: Vec<f64> = phi.iter().map(|p| p.cos()).collect();
        let is_pole: Vec<bool> = grid
            .lat
            .iter()
            .map(|lat| 90.0 - lat.abs() < POLE_TOLERANCE)
            .collect();

        let idx = |j: usize, i: usize, k: usize| (j * nlon + i) * nlev + k;
        let mut out = vec![MISSING_VALUE; len];

        for k in 0..nlev {
            for j in 0..nlat {
                if is_pole[j] {
                    continue;
                }
                let (jm, jp) = if j == 0 {
                    (0, 1)
                } else if j == nlat - 1 {
                    (nlat - 2, nlat - 1)
                } else {
                    (j - 1, j + 1)
                };
                let dphi = phi[jp] - phi[jm];
                let scale = 1.0 / (self.radius * cos[j]);

                for i in 0..nlon {
                    let (im, ip, steps) = lon_stencil(i);
                    let stencil = [
                        v[idx(j, ip, k)],
                        v[idx(j, im, k)],
                        u[idx(jp, i, k)],
                        u[idx(jm, i, k)],
                    ];
                    if stencil.iter().any(|&s| is_missing(s)) {
                        continue;
                    }
                    let [v_east, v_west, u_next, u_prev] = stencil.map(f64::from);

                    let dv_dlam = (v_east - v_west) / (steps * dlam);
                    let ducos_dphi = (u_next * cos[jp] - u_prev * cos[jm]) / dphi;
                    out[idx(j, i, k)] = ((dv_dlam - ducos_dphi) * scale) as f32;
                }
            }

            for j in (0..nlat).filter(|&j| is_pole[j]) {
                let neighbour = if j < nlat / 2 { j + 1 } else { j - 1 };
                let (sum, count) = (0..nlon)
                    .map(|i| out[idx(neighbour, i, k)])
                    .filter(|&x| !is_missing(x))
                    .fold((0.0f64, 0usize), |(s, n), x| (s + x as f64, n + 1));
                if count > 0 {
                    let mean = (sum / count as f64) as f32;
                    for i in 0..nlon {
                        out[idx(j, i, k)] = mean;
                    }
                }
            }
        }

        Ok(out)
    }
}
