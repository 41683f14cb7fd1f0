//! Flat row-major containers for gridded fields.

use std::ops::RangeInclusive;

use crate::error::{TcError, TcResult};

/// A single-level field indexed `(time, lat, lon)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field3 {
    pub nt: usize,
    pub nlat: usize,
    pub nlon: usize,
    pub data: Vec<f32>,
}

impl Field3 {
    pub fn new(nt: usize, nlat: usize, nlon: usize, data: Vec<f32>) -> TcResult<Self> {
        let expected = nt * nlat * nlon;
        if data.len() != expected {
            return Err(TcError::shape_mismatch("Field3", expected, data.len()));
        }
        Ok(Self {
            nt,
            nlat,
            nlon,
            data,
        })
    }

    /// A field with every cell set to `value`.
    pub fn filled(nt: usize, nlat: usize, nlon: usize, value: f32) -> Self {
        Self {
            nt,
            nlat,
            nlon,
            data: vec![value; nt * nlat * nlon],
        }
    }

    /// Cells per time step.
    #[inline]
    pub fn slab_len(&self) -> usize {
        self.nlat * self.nlon
    }

    #[inline]
    pub fn index(&self, t: usize, j: usize, i: usize) -> usize {
        (t * self.nlat + j) * self.nlon + i
    }

    /// Bounds-checked lookup.
    pub fn get(&self, t: usize, j: usize, i: usize) -> Option<f32> {
        if t >= self.nt || j >= self.nlat || i >= self.nlon {
            return None;
        }
        Some(self.data[self.index(t, j, i)])
    }

    pub fn slab(&self, t: usize) -> &[f32] {
        let n = self.slab_len();
        &self.data[t * n..(t + 1) * n]
    }

    pub fn slab_mut(&mut self, t: usize) -> &mut [f32] {
        let n = self.slab_len();
        &mut self.data[t * n..(t + 1) * n]
    }

    /// Negate every non-missing value in the given latitude rows.
    pub fn negate_rows(&mut self, rows: &[usize]) {
        for t in 0..self.nt {
            for &j in rows {
                let start = self.index(t, j, 0);
                for v in &mut self.data[start..start + self.nlon] {
                    if !crate::grid::is_missing(*v) {
                        *v = -*v;
                    }
                }
            }
        }
    }
}

/// A multi-level field indexed `(time, level, lat, lon)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field4 {
    pub nt: usize,
    pub nlev: usize,
    pub nlat: usize,
    pub nlon: usize,
    pub data: Vec<f32>,
}

impl Field4 {
    pub fn new(nt: usize, nlev: usize, nlat: usize, nlon: usize, data: Vec<f32>) -> TcResult<Self> {
        let expected = nt * nlev * nlat * nlon;
        if data.len() != expected {
            return Err(TcError::shape_mismatch("Field4", expected, data.len()));
        }
        Ok(Self {
            nt,
            nlev,
            nlat,
            nlon,
            data,
        })
    }

    pub fn filled(nt: usize, nlev: usize, nlat: usize, nlon: usize, value: f32) -> Self {
        Self {
            nt,
            nlev,
            nlat,
            nlon,
            data: vec![value; nt * nlev * nlat * nlon],
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        [self.nt, self.nlev, self.nlat, self.nlon]
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.nlat * self.nlon
    }

    /// Elements in one time step (all levels).
    #[inline]
    pub fn step_len(&self) -> usize {
        self.nlev * self.columns()
    }

    #[inline]
    pub fn index(&self, t: usize, k: usize, j: usize, i: usize) -> usize {
        ((t * self.nlev + k) * self.nlat + j) * self.nlon + i
    }

    pub fn get(&self, t: usize, k: usize, j: usize, i: usize) -> Option<f32> {
        if t >= self.nt || k >= self.nlev || j >= self.nlat || i >= self.nlon {
            return None;
        }
        Some(self.data[self.index(t, k, j, i)])
    }

    /// All levels of one time step, laid out `(level, lat, lon)`.
    pub fn step(&self, t: usize) -> &[f32] {
        let n = self.step_len();
        &self.data[t * n..(t + 1) * n]
    }

    /// Keep only the levels in `levels`, in order.
    pub fn select_levels(&self, levels: &[usize]) -> TcResult<Field4> {
        if let Some(&bad) = levels.iter().find(|&&k| k >= self.nlev) {
            return Err(TcError::out_of_bounds(format!(
                "level {} >= {} levels",
                bad, self.nlev
            )));
        }
        let cols = self.columns();
        let mut data = Vec::with_capacity(self.nt * levels.len() * cols);
        for t in 0..self.nt {
            for &k in levels {
                let start = self.index(t, k, 0, 0);
                data.extend_from_slice(&self.data[start..start + cols]);
            }
        }
        Field4::new(self.nt, levels.len(), self.nlat, self.nlon, data)
    }

    /// Keep a contiguous block of levels.
    pub fn level_range(&self, range: RangeInclusive<usize>) -> TcResult<Field4> {
        let levels: Vec<usize> = range.collect();
        self.select_levels(&levels)
    }

    /// Extract a single level as a [`Field3`].
    pub fn level(&self, k: usize) -> TcResult<Field3> {
        let f = self.select_levels(&[k])?;
        Field3::new(f.nt, f.nlat, f.nlon, f.data)
    }

    /// Reinterpret a single-level field as [`Field3`].
    pub fn into_field3(self) -> TcResult<Field3> {
        if self.nlev != 1 {
            return Err(TcError::shape_mismatch("single-level Field4", 1, self.nlev));
        }
        Field3::new(self.nt, self.nlat, self.nlon, self.data)
    }
}
