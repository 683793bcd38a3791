// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Anchor-box detection — corner pixels of flat-filled colour regions, grouped
// by colour and reduced to one rectangle per known colour.

use std::collections::BTreeMap;

use image::{GrayImage, Luma, RgbImage};
use imageproc::region_labelling::{Connectivity, connected_components};
use ndarray::Array2;
use tracing::{debug, instrument, warn};
use warpsynth_core::{ColorKey, ColorTable};

use crate::rect::Rectangle;

/// Convert an RGB image into a `rows x cols` array of canonical colour keys.
pub fn color_keys(image: &RgbImage) -> Array2<ColorKey> {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        ColorKey::from_rgb(image.get_pixel(x as u32, y as u32).0)
    })
}

/// Candidate corner pixels in raster order.
///
/// Compares the image with itself shifted down and right. A pixel whose lower
/// and right neighbours both differ is a bottom-right corner. Top-left
/// corners come from the same discontinuity masks shifted one pixel back
/// (cyclically, so the first row and column see the last ones). Only the
/// `(rows - 1) x (cols - 1)` interior is scanned.
pub fn corner_pixels(keys: &Array2<ColorKey>) -> Vec<(usize, usize)> {
    let (rows, cols) = keys.dim();
    if rows < 2 || cols < 2 {
        return Vec::new();
    }
    let (inner_rows, inner_cols) = (rows - 1, cols - 1);

    let horizontal = Array2::from_shape_fn((inner_rows, inner_cols), |(y, x)| {
        keys[[y, x]] != keys[[y + 1, x]]
    });
    let vertical = Array2::from_shape_fn((inner_rows, inner_cols), |(y, x)| {
        keys[[y, x]] != keys[[y, x + 1]]
    });

    let mut corners = Vec::new();
    for y in 0..inner_rows {
        let prev_y = (y + inner_rows - 1) % inner_rows;
        for x in 0..inner_cols {
            let prev_x = (x + inner_cols - 1) % inner_cols;
            let bottom_right = horizontal[[y, x]] && vertical[[y, x]];
            let top_left = horizontal[[prev_y, x]] && vertical[[y, prev_x]];
            if bottom_right || top_left {
                corners.push((y, x));
            }
        }
    }
    corners
}

/// Recover one anchor rectangle per colour of `table` present in `image`.
///
/// Rectangles come out ordered by colour key. A colour with exactly two
/// corner points (or any number when `allow_disconnected` is set) yields the
/// bounding rectangle of its points. With more points, only the points inside
/// the largest 8-connected region of that colour are kept; among equally
/// large regions the one reached first in raster order wins.
#[instrument(skip_all, fields(colors = table.len(), allow_disconnected))]
pub fn find_bounding_boxes(
    image: &RgbImage,
    table: &ColorTable,
    allow_disconnected: bool,
) -> Vec<Rectangle> {
    let keys = color_keys(image);

    let mut groups: BTreeMap<ColorKey, Vec<(usize, usize)>> = BTreeMap::new();
    for (y, x) in corner_pixels(&keys) {
        let color = keys[[y, x]];
        if table.contains(color) {
            groups.entry(color).or_default().push((y, x));
        }
    }
    debug!(groups = groups.len(), "Corner points grouped by colour");

    let mut boxes = Vec::with_capacity(groups.len());
    for (color, points) in groups {
        if points.len() < 2 {
            continue;
        }

        let points = if points.len() == 2 || allow_disconnected {
            points
        } else {
            let region = largest_region(&keys, color);
            let kept: Vec<_> = points
                .into_iter()
                .filter(|&(y, x)| region[[y, x]])
                .collect();
            if kept.is_empty() {
                warn!(%color, "Largest region holds no corner points; colour skipped");
                continue;
            }
            kept
        };

        if let Some(rect) = Rectangle::from_points(points.iter().map(|&(y, x)| (y as f64, x as f64))) {
            boxes.push(
                rect.with_name(table.name(color).map(str::to_owned))
                    .with_color(Some(color)),
            );
        }
    }

    debug!(boxes = boxes.len(), "Anchor boxes found");
    boxes
}

/// Boolean mask of the largest 8-connected region filled with `color`.
fn largest_region(keys: &Array2<ColorKey>, color: ColorKey) -> Array2<bool> {
    let (rows, cols) = keys.dim();
    let mask = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        if keys[[y as usize, x as usize]] == color {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });
    let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

    // Labels are assigned in raster order, so index == first-seen order.
    let mut areas: Vec<usize> = Vec::new();
    for pixel in labels.pixels() {
        let label = pixel.0[0] as usize;
        if label == 0 {
            continue;
        }
        if areas.len() < label {
            areas.resize(label, 0);
        }
        areas[label - 1] += 1;
    }

    let mut best: Option<(usize, usize)> = None;
    for (index, &area) in areas.iter().enumerate() {
        if best.is_none_or(|(_, best_area)| area > best_area) {
            best = Some((index + 1, area));
        }
    }
    let target = best.map_or(0, |(label, _)| label as u32);

    Array2::from_shape_fn((rows, cols), |(y, x)| {
        target != 0 && labels.get_pixel(x as u32, y as u32).0[0] == target
    })
}
