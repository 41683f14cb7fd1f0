//! The diagnostic fields consumed by the object tracker.
//!
//! | Field      | Source                                                    |
//! |------------|-----------------------------------------------------------|
//! | U300, V300 | `U`, `V` interpolated to 300 hPa                          |
//! | U850, V850 | model `U850`/`V850` if present, else interpolated         |
//! | vort850    | relative vorticity of `U`, `V` interpolated to 850 hPa    |
//! | PSL        | model `PSL` if present, else reduced from the lowest level |
//!
//! Computed fields go through the [`DerivedFieldCache`]. Southern-hemisphere
//! inversion of vorticity is applied to the returned field only, so the
//! cache always holds the physical sign. [`DiagnosticSet::write_tracker_inputs`]
//! persists the set the tracker actually reads, inversion included.

use std::path::{Path, PathBuf};

use grid_store::{vars, FieldMetadata, FieldWriter, ModelSource, StoreError};
use tc_common::{Field3, Field4, LatLonGrid, TimeAxis};
use tracing::info;

use crate::cache::{CacheKey, CacheOutcome, DerivedFieldCache};
use crate::error::Result;
use crate::slp::sea_level_pressure;
use crate::vertical::{hybrid_pressure, interpolate_to_level, P300, P850};
use crate::vorticity::VorticityEngine;

/// All tracker inputs for one case.
#[derive(Debug, Clone)]
pub struct DiagnosticSet {
    pub u300: Field3,
    pub v300: Field3,
    pub u850: Field3,
    pub v850: Field3,
    pub vort850: Field3,
    pub slp: Field3,
    pub ps: Field3,
}

/// Directory, inside a case's output directory, holding the tracker inputs.
pub const TRACKER_INPUT_DIR: &str = "tracker_inputs";

impl DiagnosticSet {
    /// `(name, units, long name, field)` of every tracker input.
    pub fn fields(&self) -> [(&'static str, &'static str, &'static str, &Field3); 7] {
        [
            ("VORT850", "1/s", "Relative vorticity at 850 hPa", &self.vort850),
            ("U850", "m/s", "Zonal wind at 850 hPa", &self.u850),
            ("V850", "m/s", "Meridional wind at 850 hPa", &self.v850),
            ("U300", "m/s", "Zonal wind at 300 hPa", &self.u300),
            ("V300", "m/s", "Meridional wind at 300 hPa", &self.v300),
            ("SLP", "Pa", "Sea-level pressure", &self.slp),
            ("PS", "Pa", "Surface pressure", &self.ps),
        ]
    }

    /// Write one store per tracker input, `{dir}/{name}.zarr`, replacing any
    /// previous ones. Returns the written paths in [`DiagnosticSet::fields`]
    /// order.
    pub fn write_tracker_inputs(
        &self,
        dir: &Path,
        grid: &LatLonGrid,
        time: &TimeAxis,
        writer: &FieldWriter,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir).map_err(StoreError::from)?;

        let mut paths = Vec::with_capacity(7);
        for (name, units, long_name, field) in self.fields() {
            let path = dir.join(format!("{}.zarr", name));
            let meta = FieldMetadata::new(name, grid, time)
                .with_units(units)
                .with_long_name(long_name);
            writer.write_field3(&path, field, &meta)?;
            paths.push(path);
        }

        info!(dir = %dir.display(), fields = paths.len(), "Wrote tracker inputs");
        Ok(paths)
    }
}

/// Computes or loads the diagnostics of one case.
///
/// Model winds and the pressure field are read at most once and shared
/// between diagnostics.
pub struct Diagnostics<'a> {
    case: String,
    source: &'a dyn ModelSource,
    cache: DerivedFieldCache,
    engine: &'a VorticityEngine,
    invert_vorticity_sh: bool,
    pressure: Option<Field4>,
    u: Option<Field4>,
    v: Option<Field4>,
}

impl<'a> Diagnostics<'a> {
    pub fn new(
        case: impl Into<String>,
        source: &'a dyn ModelSource,
        cache: DerivedFieldCache,
        engine: &'a VorticityEngine,
        invert_vorticity_sh: bool,
    ) -> Self {
        Self {
            case: case.into(),
            source,
            cache,
            engine,
            invert_vorticity_sh,
            pressure: None,
            u: None,
            v: None,
        }
    }

    fn key(&self, field: &str) -> CacheKey {
        CacheKey::new(
            &self.case,
            field,
            self.source.grid(),
            self.source.time_axis(),
            self.source.levels(),
        )
    }

    fn metadata(&self, name: &str, units: &str, long_name: &str) -> FieldMetadata {
        FieldMetadata::new(name, self.source.grid(), self.source.time_axis())
            .with_units(units)
            .with_long_name(long_name)
    }

    /// Interpolate a model wind component to `target` Pa through the cache.
    fn wind_at(&mut self, component: &str, target: f64) -> Result<Field3> {
        let field = format!("{}{}", component, (target / 100.0).round() as i64);
        let key = self.key(&field);
        let meta = self.metadata(&field, "m/s", &format!("{} wind at {} Pa", component, target));

        let Self {
            source,
            cache,
            pressure,
            u,
            v,
            ..
        } = self;
        let source = *source;
        let (field, _) = cache.get_or_compute(&key, meta, || {
            let wind = if component == vars::U {
                load_once(u, || Ok(source.read_field4(vars::U)?))?
            } else {
                load_once(v, || Ok(source.read_field4(vars::V)?))?
            };
            let pres = load_once(pressure, || pressure_field(source))?;
            interpolate_to_level(wind, pres, target)
        })?;
        Ok(field)
    }

    /// Zonal and meridional wind at 300 hPa.
    pub fn uv300(&mut self) -> Result<(Field3, Field3)> {
        Ok((self.wind_at(vars::U, P300)?, self.wind_at(vars::V, P300)?))
    }

    /// Zonal and meridional wind at 850 hPa.
    pub fn uv850(&mut self) -> Result<(Field3, Field3)> {
        if self.source.has_variable(vars::U850) && self.source.has_variable(vars::V850) {
            info!(case = %self.case, "Using model U850/V850");
            return Ok((
                self.source.read_field3(vars::U850)?,
                self.source.read_field3(vars::V850)?,
            ));
        }
        Ok((self.wind_at(vars::U, P850)?, self.wind_at(vars::V, P850)?))
    }

    /// Relative vorticity at 850 hPa, sign-inverted south of the equator
    /// when configured.
    pub fn vort850(&mut self) -> Result<Field3> {
        let key = self.key("vort850");
        let meta = self.metadata("vorticity", "1/s", "Relative vorticity at 850 hPa");

        let Self {
            source,
            cache,
            engine,
            pressure,
            u,
            v,
            ..
        } = self;
        let source = *source;
        let engine = *engine;
        let (mut vort, _) = cache.get_or_compute(&key, meta, || {
            let u = load_once(u, || Ok(source.read_field4(vars::U)?))?;
            let v = load_once(v, || Ok(source.read_field4(vars::V)?))?;
            let pres = load_once(pressure, || pressure_field(source))?;
            engine.vorticity_at_pressure(source.grid(), u, v, pres, P850)
        })?;

        if self.invert_vorticity_sh {
            let rows: Vec<usize> = self.source.grid().southern_rows().collect();
            info!(case = %self.case, rows = rows.len(), "Inverting Southern Hemisphere vorticity");
            vort.negate_rows(&rows);
        }
        Ok(vort)
    }

    /// Sea-level pressure.
    pub fn slp(&mut self) -> Result<Field3> {
        if self.source.has_variable(vars::PSL) {
            info!(case = %self.case, "Using model PSL");
            return Ok(self.source.read_field3(vars::PSL)?);
        }

        let key = self.key(vars::PSL);
        let meta = self.metadata(vars::PSL, "Pa", "Sea-level Pressure");

        let Self {
            source,
            cache,
            pressure,
            ..
        } = self;
        let source = *source;
        let (slp, outcome) = cache.get_or_compute(&key, meta, || {
            let lowest = |name: &str| -> Result<Field3> {
                let f = source.read_field4(name)?;
                Ok(f.level(f.nlev.saturating_sub(1))?)
            };
            let pres = load_once(pressure, || pressure_field(source))?;
            let p1 = pres.level(pres.nlev.saturating_sub(1))?;
            sea_level_pressure(&lowest(vars::T)?, &lowest(vars::Q)?, &lowest(vars::Z3)?, &p1)
        })?;
        if outcome == CacheOutcome::Computed {
            info!(case = %self.case, "Reduced sea-level pressure from the lowest model level");
        }
        Ok(slp)
    }

    /// Surface pressure as stored by the model.
    pub fn surface_pressure(&self) -> Result<Field3> {
        Ok(self.source.read_field3(vars::PS)?)
    }

    /// Every tracker input.
    pub fn compute_all(&mut self) -> Result<DiagnosticSet> {
        let (u300, v300) = self.uv300()?;
        let (u850, v850) = self.uv850()?;
        let vort850 = self.vort850()?;
        let slp = self.slp()?;
        let ps = self.surface_pressure()?;

        Ok(DiagnosticSet {
            u300,
            v300,
            u850,
            v850,
            vort850,
            slp,
            ps,
        })
    }
}

/// `hyam * P0 + hybm * PS` for the source's levels.
pub fn pressure_field(source: &dyn ModelSource) -> Result<Field4> {
    let ps = source.read_field3(vars::PS)?;
    hybrid_pressure(source.hybrid(), &ps)
}

fn load_once<'s>(
    slot: &'s mut Option<Field4>,
    load: impl FnOnce() -> Result<Field4>,
) -> Result<&'s Field4> {
    let field = match slot.take() {
        Some(field) => field,
        None => load()?,
    };
    Ok(slot.insert(field))
}
