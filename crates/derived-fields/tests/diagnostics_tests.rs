//! Integration tests for the diagnostic fields, the vorticity engine and the
//! on-disk cache.

use derived_fields::{
    interpolate_to_pressure, pressure_field, CacheKey, CacheOutcome, DerivedFieldCache,
    DerivedFieldError, Diagnostics, FiniteDifferenceVorticity, VorticityEngine, EARTH_RADIUS, P300,
    P850,
};
use grid_store::{
    vars, FieldMetadata, FieldReader, MemorySource, ModelSource, StoreConfig, ZarrModelSource,
};
use tc_common::{Field4, MISSING_VALUE};
use test_utils::{assert_approx_eq, band_grid, SyntheticCase};

const OMEGA: f64 = 1.0e-5;

/// Winds of solid-body rotation, uniform in the vertical.
fn solid_body_case() -> (SyntheticCase, MemorySource) {
    let case = SyntheticCase::new(band_grid(-40.0, 5.0, 17, 36), 3, 10);
    let u = case.field4(|_, _, lat, _| (OMEGA * EARTH_RADIUS * lat.to_radians().cos()) as f32);
    let v = case.field4(|_, _, _, _| 0.0);
    let source = case
        .source()
        .with_field4(vars::U, u)
        .with_field4(vars::V, v);
    (case, source)
}

/// Winds equal to pressure in hPa.
fn pressure_wind_case() -> (SyntheticCase, MemorySource) {
    let case = SyntheticCase::new(band_grid(-10.0, 10.0, 3, 4), 2, 10);
    let u = case.field4(|_, p, _, _| (p / 100.0) as f32);
    let v = case.field4(|_, p, _, _| (-p / 100.0) as f32);
    let source = case
        .source()
        .with_field4(vars::U, u)
        .with_field4(vars::V, v)
        .with_field4(vars::T, case.field4(|_, _, _, _| 288.0))
        .with_field4(vars::Q, case.field4(|_, _, _, _| 0.0))
        .with_field4(vars::Z3, case.field4(|_, _, _, _| 0.0));
    (case, source)
}

fn engine() -> VorticityEngine {
    VorticityEngine::new(FiniteDifferenceVorticity::default(), 2).unwrap()
}

#[test]
fn test_interpolation_hits_existing_levels_exactly() {
    let (case, source) = pressure_wind_case();
    let pres = pressure_field(&source).unwrap();
    let u = source.read_field4(vars::U).unwrap();

    let out = interpolate_to_pressure(&u, &pres, &[P300, 1000.0, 55000.0]).unwrap();
    assert_eq!(out.nlev, 3);
    for t in 0..case.nt() {
        assert_eq!(out.get(t, 0, 1, 2), Some(300.0));
        // Above the model top: clamped to the top level.
        assert_eq!(out.get(t, 1, 1, 2), Some(100.0));
        assert_approx_eq!(out.get(t, 2, 0, 0).unwrap(), 550.0, 1e-3);
    }
}

#[test]
fn test_below_surface_is_missing_per_column() {
    let (mut case, _) = pressure_wind_case();
    case.surface_pressure = 80000.0;
    let low = case.ps();
    let mut ps = SyntheticCase::new(case.grid.clone(), 2, 10).ps();
    // Column (j=1, i=2) has its surface at 800 hPa.
    for t in 0..2 {
        let idx = ps.index(t, 1, 2);
        ps.data[idx] = low.data[idx];
    }

    let u = case.field4(|_, _, _, _| 1.0);
    let pres = derived_fields::hybrid_pressure(&case.hybrid, &ps).unwrap();
    let out = interpolate_to_pressure(&u, &pres, &[P850]).unwrap();

    for t in 0..2 {
        assert_eq!(out.get(t, 0, 1, 2), Some(MISSING_VALUE));
        assert_eq!(out.get(t, 0, 1, 1), Some(1.0));
    }
}

#[test]
fn test_vorticity_at_850_matches_solid_body_rotation() {
    let (case, source) = solid_body_case();
    let pres = pressure_field(&source).unwrap();
    let u = source.read_field4(vars::U).unwrap();
    let v = source.read_field4(vars::V).unwrap();

    let vort = engine()
        .vorticity_at_pressure(&case.grid, &u, &v, &pres, P850)
        .unwrap();

    assert_eq!((vort.nt, vort.nlat, vort.nlon), (3, 17, 36));
    for j in 1..16 {
        let expected = 2.0 * OMEGA * case.grid.lat[j].to_radians().sin();
        assert_approx_eq!(vort.get(2, j, 7).unwrap(), expected, 2e-2 * OMEGA);
    }
}

#[test]
fn test_southern_vorticity_is_inverted_but_cached_physically() {
    let (case, source) = solid_body_case();
    let temp_dir = tempfile::tempdir().unwrap();
    let engine = engine();

    let cache = DerivedFieldCache::new(temp_dir.path(), StoreConfig::default());
    let mut diagnostics = Diagnostics::new("c1", &source, cache, &engine, true);
    let vort = diagnostics.vort850().unwrap();

    // Row 0 is 40S: cyclonic rotation there is clockwise, so the raw value is
    // negative and the inverted one positive.
    assert!(vort.get(0, 0, 0).unwrap() > 0.0);
    assert!(vort.get(0, 16, 0).unwrap() > 0.0);

    let cached = FieldReader::open(&temp_dir.path().join("c1.vort850.zarr"))
        .unwrap()
        .read_field3()
        .unwrap();
    assert!(cached.get(0, 0, 0).unwrap() < 0.0);
    assert_eq!(cached.get(0, 16, 0), vort.get(0, 16, 0));
    assert_eq!(case.grid.southern_rows().count(), 8);
}

#[test]
fn test_cache_loads_matching_and_recomputes_stale() {
    let temp_dir = tempfile::tempdir().unwrap();
    let case = SyntheticCase::new(band_grid(0.0, 1.0, 2, 3), 2, 4);
    let cache = DerivedFieldCache::new(temp_dir.path(), StoreConfig::default());
    let key = CacheKey::new("c1", "PSL", &case.grid, &case.time, &case.lev);
    let meta = FieldMetadata::new("PSL", &case.grid, &case.time);

    let (first, outcome) = cache
        .get_or_compute(&key, meta.clone(), || Ok(case.field3(|t, _, _| t as f32)))
        .unwrap();
    assert_eq!(outcome, CacheOutcome::Computed);

    let (second, outcome) = cache
        .get_or_compute(&key, meta.clone(), || {
            Err(DerivedFieldError::invalid_input("must not recompute"))
        })
        .unwrap();
    assert_eq!(outcome, CacheOutcome::Loaded);
    assert_eq!(first, second);

    let mut stale = key.clone();
    stale.levels.pop();
    let (third, outcome) = cache
        .get_or_compute(&stale, meta, || Ok(case.field3(|_, _, _| 7.0)))
        .unwrap();
    assert_eq!(outcome, CacheOutcome::Computed);
    assert!(third.data.iter().all(|&v| v == 7.0));
}

#[test]
fn test_failed_computation_writes_nothing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let case = SyntheticCase::new(band_grid(0.0, 1.0, 2, 3), 1, 4);
    let cache = DerivedFieldCache::new(temp_dir.path(), StoreConfig::default());
    let key = CacheKey::new("c1", "U300", &case.grid, &case.time, &case.lev);

    let result = cache.get_or_compute(&key, FieldMetadata::new("U300", &case.grid, &case.time), || {
        Err(DerivedFieldError::task_failed(0, "boom"))
    });
    assert!(result.is_err());
    assert!(!cache.path_for(&key).exists());
}

#[test]
fn test_model_winds_and_psl_are_used_directly() {
    let (case, source) = pressure_wind_case();
    let source = source
        .with_field3(vars::U850, case.field3(|_, _, _| 11.0))
        .with_field3(vars::V850, case.field3(|_, _, _| 12.0))
        .with_field3(vars::PSL, case.field3(|_, _, _| 101000.0));
    let temp_dir = tempfile::tempdir().unwrap();
    let engine = engine();
    let cache = DerivedFieldCache::new(temp_dir.path(), StoreConfig::default());
    let mut diagnostics = Diagnostics::new("c1", &source, cache, &engine, true);

    let (u850, v850) = diagnostics.uv850().unwrap();
    assert!(u850.data.iter().all(|&v| v == 11.0));
    assert!(v850.data.iter().all(|&v| v == 12.0));
    assert!(diagnostics.slp().unwrap().data.iter().all(|&v| v == 101000.0));

    assert!(!temp_dir.path().join("c1.U850.zarr").exists());
    assert!(!temp_dir.path().join("c1.PSL.zarr").exists());
}

#[test]
fn test_all_diagnostics_from_zarr_case() {
    let (case, source) = pressure_wind_case();
    let temp_dir = tempfile::tempdir().unwrap();
    let case_dir = temp_dir.path().join("case");
    let out_dir = temp_dir.path().join("out");

    let fields4: Vec<(&str, Field4)> = [vars::U, vars::V, vars::T, vars::Q, vars::Z3]
        .iter()
        .map(|name| (*name, source.read_field4(name).unwrap()))
        .collect();
    let refs: Vec<(&str, &Field4)> = fields4.iter().map(|(n, f)| (*n, f)).collect();
    case.write_case_dir(&case_dir, &[], &refs);

    let zarr = ZarrModelSource::open(&case_dir, 200.0).unwrap();
    assert_eq!(zarr.levels().len(), 9);

    let engine = engine();
    let cache = DerivedFieldCache::new(&out_dir, StoreConfig::default());
    let set = Diagnostics::new("c1", &zarr, cache, &engine, true)
        .compute_all()
        .unwrap();

    assert!(set.u300.data.iter().all(|&v| v == 300.0));
    assert!(set.v300.data.iter().all(|&v| v == -300.0));
    assert!(set.u850.data.iter().all(|&v| (v - 850.0).abs() < 1e-3));
    assert!(set.slp.data.iter().all(|&v| v == 100000.0));
    assert_eq!(set.ps, case.ps());

    // Uniform u = 850 m/s on rows 10S, EQ, 10N. Only the `u tanφ / a` part
    // survives: zero on the centred equator row, one-sided on the edge rows.
    // The 10S row is cyclonic after inversion, so both edges are positive.
    let dphi = 10.0f64.to_radians();
    let edge = 850.0 * (1.0 - dphi.cos()) / (EARTH_RADIUS * dphi.cos() * dphi);
    for t in 0..set.vort850.nt {
        for i in 0..set.vort850.nlon {
            assert!(set.vort850.get(t, 1, i).unwrap().abs() < 1e-9);
            for j in [0, 2] {
                let got = set.vort850.get(t, j, i).unwrap() as f64;
                assert!(
                    (got - edge).abs() < 1e-3 * edge,
                    "row {}: {} vs {}",
                    j,
                    got,
                    edge
                );
            }
        }
    }

    for field in ["U300", "V300", "U850", "V850", "vort850", "PSL"] {
        assert!(
            out_dir.join(format!("c1.{}.zarr", field)).join("zarr.json").is_file(),
            "{} not cached",
            field
        );
    }
}

#[test]
fn test_missing_temperature_fails_slp() {
    let (case, _) = pressure_wind_case();
    let source = case.source();
    let temp_dir = tempfile::tempdir().unwrap();
    let engine = engine();
    let cache = DerivedFieldCache::new(temp_dir.path(), StoreConfig::default());
    let mut diagnostics = Diagnostics::new("c1", &source, cache, &engine, false);

    assert!(matches!(
        diagnostics.slp(),
        Err(DerivedFieldError::Store(grid_store::StoreError::MissingVariable(_)))
    ));
}
