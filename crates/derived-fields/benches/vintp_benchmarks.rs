//! Benchmarks for vertical interpolation and the vorticity engine.
//!
//! Run with: cargo bench --package derived-fields --bench vintp_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use derived_fields::{
    hybrid_pressure, interpolate_to_level, FiniteDifferenceVorticity, VorticityEngine, P850,
};
use test_utils::{global_grid, SyntheticCase};

/// A case with a smooth wind pattern.
fn wavy_case(nlat: usize, nlon: usize, nt: usize, nlev: usize) -> SyntheticCase {
    SyntheticCase::new(global_grid(nlat, nlon), nt, nlev)
}

// =============================================================================
// VERTICAL INTERPOLATION BENCHMARKS
// =============================================================================

fn bench_interpolate_to_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolate_to_level");

    for (nlat, nlon) in [(96, 144), (192, 288)] {
        let case = wavy_case(nlat, nlon, 4, 32);
        let u = case.field4(|t, p, lat, lon| {
            (p / 1000.0 + lat.to_radians().cos() * 10.0 + (lon + t as f64).to_radians().sin()) as f32
        });
        let pres = match hybrid_pressure(&case.hybrid, &case.ps()) {
            Ok(p) => p,
            Err(e) => panic!("pressure: {}", e),
        };

        group.throughput(Throughput::Elements(u.data.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("grid", format!("{}x{}", nlat, nlon)),
            &(u, pres),
            |b, (u, pres)| {
                b.iter(|| interpolate_to_level(black_box(u), black_box(pres), P850));
            },
        );
    }

    group.finish();
}

// =============================================================================
// VORTICITY ENGINE BENCHMARKS
// =============================================================================

fn bench_relative_vorticity(c: &mut Criterion) {
    let mut group = c.benchmark_group("relative_vorticity");
    let case = wavy_case(96, 144, 8, 3);
    let u = case.field4(|_, _, lat, lon| (lat.to_radians().cos() * 20.0 + lon.to_radians().sin()) as f32);
    let v = case.field4(|_, _, lat, lon| (lat.to_radians().sin() * lon.to_radians().cos() * 5.0) as f32);

    group.throughput(Throughput::Elements(u.nt as u64));
    for workers in [1usize, 2, 4] {
        let engine = match VorticityEngine::new(FiniteDifferenceVorticity::default(), workers) {
            Ok(engine) => engine,
            Err(e) => panic!("engine: {}", e),
        };
        group.bench_with_input(BenchmarkId::new("workers", workers), &engine, |b, engine| {
            b.iter(|| engine.relative_vorticity(black_box(&case.grid), black_box(&u), black_box(&v)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_interpolate_to_level, bench_relative_vorticity);
criterion_main!(benches);
