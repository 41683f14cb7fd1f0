//! Column-wise interpolation from model levels to fixed pressure levels.
//!
//! Every `(time, lat, lon)` column carries its own pressure profile, which
//! may increase or decrease with the level index. Within a column:
//!
//! - a target at an existing level returns that level's value exactly,
//! - a target between two levels is interpolated linearly in pressure,
//! - a target above the top level (lower pressure) takes the top value,
//! - a target below the surface-most level yields [`MISSING_VALUE`].

use std::ops::RangeInclusive;

use grid_store::HybridCoefficients;
use num_traits::Float;
use rayon::prelude::*;
use tc_common::{is_missing, Field3, Field4, MISSING_VALUE};

use crate::error::{DerivedFieldError, Result};

/// Target pressure of the upper-level wind diagnostics (Pa).
pub const P300: f64 = 30000.0;

/// Target pressure of the low-level wind and vorticity diagnostics (Pa).
pub const P850: f64 = 85000.0;

/// Where a target pressure falls within one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bracket<F> {
    /// Below the surface-most level; no value is defined.
    BelowSurface,
    /// Exactly at, or clamped to, level `k`.
    Level(usize),
    /// `value[a] + weight * (value[b] - value[a])`.
    Between { a: usize, b: usize, weight: F },
}

/// Locate `target` in a monotonic pressure column.
pub fn bracket<F: Float>(pres: &[F], target: F) -> Bracket<F> {
    let n = pres.len();
    if n == 0 || target.is_nan() {
        return Bracket::BelowSurface;
    }

    // View the column in ascending-pressure order.
    let descending = pres[0] > pres[n - 1];
    let at = |k: usize| if descending { n - 1 - k } else { k };
    let p = |k: usize| pres[at(k)];

    if target > p(n - 1) {
        return Bracket::BelowSurface;
    }
    if target <= p(0) {
        return Bracket::Level(at(0));
    }

    // Invariant: p(lo) < target <= p(hi)
    let (mut lo, mut hi) = (0, n - 1);
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if p(mid) >= target {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    if p(hi) == target {
        return Bracket::Level(at(hi));
    }
    Bracket::Between {
        a: at(lo),
        b: at(hi),
        weight: (target - p(lo)) / (p(hi) - p(lo)),
    }
}

/// Interpolate a single column. `None` means below the surface.
pub fn interp_column<F: Float>(values: &[F], pres: &[F], target: F) -> Option<F> {
    if values.len() != pres.len() {
        return None;
    }
    match bracket(pres, target) {
        Bracket::BelowSurface => None,
        Bracket::Level(k) => Some(values[k]),
        Bracket::Between { a, b, weight } => Some(values[a] + weight * (values[b] - values[a])),
    }
}

fn check_same_shape(var: &Field4, pres: &Field4) -> Result<()> {
    if var.shape() != pres.shape() {
        return Err(DerivedFieldError::invalid_input(format!(
            "field shape {:?} does not match pressure shape {:?}",
            var.shape(),
            pres.shape()
        )));
    }
    Ok(())
}

/// Interpolate `var` to each pressure in `plevs` (Pa).
///
/// Returns a field with one level per target pressure. Time steps are
/// processed in parallel.
pub fn interpolate_to_pressure(var: &Field4, pres: &Field4, plevs: &[f64]) -> Result<Field4> {
    check_same_shape(var, pres)?;

    let cols = var.columns();
    let nlev = var.nlev;
    let out_step = plevs.len() * cols;
    let mut out = vec![MISSING_VALUE; var.nt * out_step];
    if out.is_empty() {
        return Ok(Field4::new(var.nt, plevs.len(), var.nlat, var.nlon, out)?);
    }

    out.par_chunks_mut(out_step)
        .enumerate()
        .for_each(|(t, slab)| {
            let values = var.step(t);
            let pressure = pres.step(t);
            let mut column = vec![0.0f64; nlev];

            for c in 0..cols {
                for (k, p) in column.iter_mut().enumerate() {
                    *p = pressure[k * cols + c] as f64;
                }
                for (n, &target) in plevs.iter().enumerate() {
                    slab[n * cols + c] = match bracket(&column, target) {
                        Bracket::BelowSurface => MISSING_VALUE,
                        Bracket::Level(k) => values[k * cols + c],
                        Bracket::Between { a, b, weight } => {
                            let va = values[a * cols + c];
                            let vb = values[b * cols + c];
                            if is_missing(va) || is_missing(vb) {
                                MISSING_VALUE
                            } else {
                                (va as f64 + weight * (vb as f64 - va as f64)) as f32
                            }
                        }
                    };
                }
            }
        });

    Ok(Field4::new(var.nt, plevs.len(), var.nlat, var.nlon, out)?)
}

/// Interpolate to a single pressure level.
pub fn interpolate_to_level(var: &Field4, pres: &Field4, target: f64) -> Result<Field3> {
    Ok(interpolate_to_pressure(var, pres, &[target])?.into_field3()?)
}

/// Smallest contiguous level range that brackets `target` in every column,
/// widened by one level on each side and clamped to the valid indices.
///
/// Columns where `target` lies below the surface contribute their
/// surface-most level.
pub fn bracketing_levels(pres: &Field4, target: f64) -> Option<RangeInclusive<usize>> {
    let nlev = pres.nlev;
    if nlev == 0 || pres.nt == 0 || pres.columns() == 0 {
        return None;
    }

    let cols = pres.columns();
    let (k_min, k_max) = (0..pres.nt)
        .into_par_iter()
        .map(|t| {
            let step = pres.step(t);
            let mut column = vec![0.0f64; nlev];
            let mut range = (usize::MAX, 0usize);
            for c in 0..cols {
                for (k, p) in column.iter_mut().enumerate() {
                    *p = step[k * cols + c] as f64;
                }
                let (a, b) = match bracket(&column, target) {
                    Bracket::Level(k) => (k, k),
                    Bracket::Between { a, b, .. } => (a.min(b), a.max(b)),
                    Bracket::BelowSurface => {
                        let surface = if column[0] > column[nlev - 1] { 0 } else { nlev - 1 };
                        (surface, surface)
                    }
                };
                range = (range.0.min(a), range.1.max(b));
            }
            range
        })
        .reduce(|| (usize::MAX, 0), |x, y| (x.0.min(y.0), x.1.max(y.1)));

    Some(k_min.saturating_sub(1)..=(k_max + 1).min(nlev - 1))
}

/// Pressure at hybrid-level midpoints: `hyam * P0 + hybm * PS`.
pub fn hybrid_pressure(hybrid: &HybridCoefficients, ps: &Field3) -> Result<Field4> {
    let nlev = hybrid.hyam.len();
    if nlev == 0 || hybrid.hybm.len() != nlev {
        return Err(DerivedFieldError::invalid_input(format!(
            "hybrid coefficients have {} and {} levels",
            nlev,
            hybrid.hybm.len()
        )));
    }

    let cols = ps.slab_len();
    let step = nlev * cols;
    let mut out = vec![MISSING_VALUE; ps.nt * step];
    if !out.is_empty() {
        out.par_chunks_mut(step).enumerate().for_each(|(t, slab)| {
            let surface = ps.slab(t);
            for k in 0..nlev {
                let a = hybrid.hyam[k] * hybrid.p0;
                let b = hybrid.hybm[k];
                for (dst, &p) in slab[k * cols..(k + 1) * cols].iter_mut().zip(surface) {
                    if !is_missing(p) {
                        *dst = (a + b * p as f64) as f32;
                    }
                }
            }
        });
    }

    Ok(Field4::new(ps.nt, nlev, ps.nlat, ps.nlon, out)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRES: [f64; 5] = [20000.0, 40000.0, 60000.0, 80000.0, 95000.0];
    const VALS: [f64; 5] = [10.0, 8.0, 6.0, 4.0, 2.0];

    #[test]
    fn test_exact_level_returns_level_value() {
        for (p, v) in PRES.iter().zip(VALS) {
            assert_eq!(interp_column(&VALS, &PRES, *p), Some(v));
        }
    }

    #[test]
    fn test_linear_between_levels() {
        let v = interp_column(&VALS, &PRES, 50000.0).unwrap();
        assert!((v - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_below_surface_is_missing() {
        assert_eq!(interp_column(&VALS, &PRES, 100000.0), None);
        assert_eq!(interp_column(&VALS, &PRES, 95000.001), None);
    }

    #[test]
    fn test_above_top_clamps() {
        assert_eq!(interp_column(&VALS, &PRES, 100.0), Some(10.0));
    }

    #[test]
    fn test_descending_column() {
        let mut pres = PRES;
        let mut vals = VALS;
        pres.reverse();
        vals.reverse();
        assert_eq!(interp_column(&vals, &pres, 60000.0), Some(6.0));
        let v = interp_column(&vals, &pres, 70000.0).unwrap();
        assert!((v - 5.0).abs() < 1e-12);
        assert_eq!(interp_column(&vals, &pres, 99000.0), None);
        assert_eq!(interp_column(&vals, &pres, 1000.0), Some(10.0));
    }

    #[test]
    fn test_single_level_column() {
        assert_eq!(interp_column(&[3.0f32], &[50000.0], 40000.0), Some(3.0));
        assert_eq!(interp_column(&[3.0f32], &[50000.0], 60000.0), None);
    }

    #[test]
    fn test_bracket_reports_original_indices() {
        let pres = [95000.0, 80000.0, 60000.0];
        match bracket(&pres, 85000.0) {
            Bracket::Between { a, b, weight } => {
                assert_eq!((a, b), (1, 0));
                assert!((weight - 1.0 / 3.0).abs() < 1e-12);
            }
            other => panic!("unexpected bracket {:?}", other),
        }
    }

    #[test]
    fn test_bracketing_levels_spans_all_columns() {
        // Two columns with different profiles; 85000 Pa falls between
        // levels 2..3 in the first and 3..4 in the second.
        let pres = Field4::new(
            1,
            5,
            1,
            2,
            vec![
                20000.0, 20000.0, 50000.0, 50000.0, 80000.0, 70000.0, 90000.0, 80000.0, 100000.0,
                90000.0,
            ],
        )
        .unwrap();
        assert_eq!(bracketing_levels(&pres, 85000.0), Some(1..=4));
        assert_eq!(bracketing_levels(&pres, 10000.0), Some(0..=1));
        // Below every surface: surface-most level, widened and clamped.
        assert_eq!(bracketing_levels(&pres, 110000.0), Some(3..=4));
    }

    #[test]
    fn test_hybrid_pressure() {
        let hybrid = HybridCoefficients {
            hyam: vec![0.2, 0.0],
            hybm: vec![0.0, 0.9],
            p0: 100000.0,
        };
        let ps = Field3::new(1, 1, 2, vec![100000.0, MISSING_VALUE]).unwrap();
        let pres = hybrid_pressure(&hybrid, &ps).unwrap();
        assert_eq!(pres.shape(), [1, 2, 1, 2]);
        assert_eq!(pres.get(0, 0, 0, 0), Some(20000.0));
        assert_eq!(pres.get(0, 1, 0, 0), Some(90000.0));
        assert_eq!(pres.get(0, 1, 0, 1), Some(MISSING_VALUE));
    }
}
