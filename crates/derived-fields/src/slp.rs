//! Sea-level pressure reduced from the lowest model level.

use rayon::prelude::*;
use tc_common::{is_missing, Field3, MISSING_VALUE};

use crate::error::{DerivedFieldError, Result};

/// Gravitational acceleration (m s⁻²).
pub const GRAVITY: f64 = 9.80616;

/// Specific heat of dry air at constant pressure (J kg⁻¹ K⁻¹).
pub const CP: f64 = 1004.64;

/// Gas constant of dry air (J kg⁻¹ K⁻¹).
pub const RD: f64 = 287.04;

/// Ratio of the moist virtual-temperature correction.
const VIRTUAL_FACTOR: f64 = 0.608;

/// Reduce pressure at the lowest model level to sea level.
///
/// `SLP = (g·Z / (Cp·Tv) + 1)^(Cp/Rd) · P` with `Tv = T·(1 + 0.608·Q)`.
/// All inputs are the lowest-level values of temperature (K), specific
/// humidity (kg/kg), geopotential height (m) and pressure (Pa).
pub fn sea_level_pressure(t: &Field3, q: &Field3, z: &Field3, p: &Field3) -> Result<Field3> {
    let shape = (t.nt, t.nlat, t.nlon);
    for (name, f) in [("Q", q), ("Z3", z), ("pressure", p)] {
        if (f.nt, f.nlat, f.nlon) != shape {
            return Err(DerivedFieldError::invalid_input(format!(
                "{} shape {:?} does not match T shape {:?}",
                name,
                (f.nt, f.nlat, f.nlon),
                shape
            )));
        }
    }

    let exponent = CP / RD;
    let data: Vec<f32> = t
        .data
        .par_iter()
        .zip(&q.data)
        .zip(&z.data)
        .zip(&p.data)
        .map(|(((&t, &q), &z), &p)| {
            if [t, q, z, p].iter().any(|&x| is_missing(x)) {
                return MISSING_VALUE;
            }
            let tv = t as f64 * (1.0 + VIRTUAL_FACTOR * q as f64);
            ((GRAVITY * z as f64 / (CP * tv) + 1.0).powf(exponent) * p as f64) as f32
        })
        .collect();

    Ok(Field3::new(t.nt, t.nlat, t.nlon, data)?)
}
