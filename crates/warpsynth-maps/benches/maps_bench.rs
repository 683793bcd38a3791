// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the warpsynth-maps crate. Covers backward-map
// synthesis and photo-space resampling on a synthetic bulging page.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array3;

use warpsynth_maps::raster::uv_from_fn;
use warpsynth_maps::{BackwardMap, SamplingGrid, UvRaster};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 128x128 photo of a page bulging sideways, with a background border.
fn synthetic_uv() -> UvRaster {
    let n = 127.0;
    uv_from_fn(128, 128, |r, c| {
        let (y, x) = (r as f64 / n, c as f64 / n);
        let valid = if (0.05..0.95).contains(&y) && (0.05..0.95).contains(&x) { 1.0 } else { 0.0 };
        let bulge = 0.03 * (std::f64::consts::PI * y).sin();
        [valid, 1.0 - y, (x + bulge).clamp(0.0, 1.0)]
    })
    .unwrap_or_else(|err| panic!("fixture: {err}"))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_backward_map(c: &mut Criterion) {
    let uv = synthetic_uv();
    c.bench_function("backward_map (128x128 -> 64)", |b| {
        b.iter(|| black_box(BackwardMap::from_uv(black_box(&uv), 64, true)));
    });
}

fn bench_grid_sample(c: &mut Criterion) {
    let uv = synthetic_uv();
    let grid = SamplingGrid::from_uv(&uv);
    let source = Array3::from_shape_fn((64, 64, 2), |(i, j, k)| (i + j * k) as f64);
    c.bench_function("grid_sample (64x64x2 -> 128x128)", |b| {
        b.iter(|| black_box(grid.sample(black_box(&source))));
    });
}

criterion_group!(benches, bench_backward_map, bench_grid_sample);
criterion_main!(benches);
