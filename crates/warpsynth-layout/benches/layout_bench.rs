// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the warpsynth-layout crate. Covers anchor
// detection and field growth on a synthetic colour-tagged template.

use std::collections::BTreeMap;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use ndarray::Array2;

use warpsynth_core::{ColorKey, ColorTable, FieldLayout};
use warpsynth_layout::{Rectangle, expand_children, extract_template_fields, find_bounding_boxes};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const CONTAINER: [u8; 3] = [255, 255, 0];

/// A 400x300 white page with one container holding a 4x3 grid of field
/// anchors, each tagged with its own blue shade.
fn synthetic_template() -> (RgbImage, FieldLayout) {
    let mut image = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
    for y in 20..280 {
        for x in 20..380 {
            image.put_pixel(x, y, Rgb(CONTAINER));
        }
    }

    let mut fields = BTreeMap::new();
    for row in 0..3u32 {
        for col in 0..4u32 {
            let shade = (row * 4 + col + 1) as u8;
            let (y0, x0) = (50 + row * 80, 40 + col * 90);
            for y in y0..y0 + 10 {
                for x in x0..x0 + 30 {
                    image.put_pixel(x, y, Rgb([0, shade, 255]));
                }
            }
            fields.insert(ColorKey::from_rgb([0, shade, 255]), format!("field_{row}_{col}"));
        }
    }

    let layout = FieldLayout {
        containers: BTreeMap::from([(ColorKey::from_rgb(CONTAINER), fields)]),
    };
    (image, layout)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_find_bounding_boxes(c: &mut Criterion) {
    let (image, layout) = synthetic_template();
    let table: ColorTable = layout.field_table();

    c.bench_function("find_bounding_boxes (400x300, 12 fields)", |b| {
        b.iter(|| black_box(find_bounding_boxes(black_box(&image), &table, false)));
    });
}

/// Field growth dominates extraction time: every step re-checks sibling
/// overlap and the occlusion patch.
fn bench_expand_children(c: &mut Criterion) {
    let (image, layout) = synthetic_template();
    let anchors = find_bounding_boxes(&image, &layout.field_table(), false);
    let parent = Rectangle::from_corners(20.0, 20.0, 279.0, 379.0);
    let occlusion = Array2::from_elem((300, 400), false);

    c.bench_function("expand_children (12 fields)", |b| {
        b.iter(|| black_box(expand_children(&parent, black_box(&anchors), &occlusion)));
    });
}

fn bench_extract_template_fields(c: &mut Criterion) {
    let (image, layout) = synthetic_template();

    c.bench_function("extract_template_fields (400x300)", |b| {
        b.iter(|| black_box(extract_template_fields(black_box(&image), &layout)));
    });
}

criterion_group!(
    benches,
    bench_find_bounding_boxes,
    bench_expand_children,
    bench_extract_template_fields
);
criterion_main!(benches);
