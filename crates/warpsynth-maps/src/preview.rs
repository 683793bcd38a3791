// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Map previews — PNG renderings of the dense maps for visual inspection.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::{Array2, Array3, ArrayView3};
use tracing::{debug, instrument};
use warpsynth_core::error::{Result, WarpsynthError};

use crate::angle::WarpedAngle;
use crate::backward::BackwardMap;
use crate::curvature::WarpedCurvature;
use crate::text_mask::WarpedTextMask;

/// Scale so the longer side equals `size`.
fn resized(image: RgbImage, size: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let ratio = f64::from(size) / f64::from(width.max(height).max(1));
    let new_width = ((f64::from(width) * ratio) as u32).max(1);
    let new_height = ((f64::from(height) * ratio) as u32).max(1);
    imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}

fn save(image: RgbImage, size: u32, path: &Path) -> Result<()> {
    resized(image, size)
        .save(path)
        .map_err(|err| WarpsynthError::Image(format!("cannot write {}: {err}", path.display())))?;
    debug!(path = %path.display(), "Preview written");
    Ok(())
}

/// Pack up to three channels of unit-range values into an image, channel 0
/// into blue, 1 into green and 2 into red. Pixels outside `valid` stay black.
fn pack(channels: ArrayView3<'_, f64>, valid: Option<&Array2<bool>>) -> RgbImage {
    let (rows, cols, depth) = channels.dim();
    RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        let (i, j) = (y as usize, x as usize);
        if valid.is_some_and(|mask| !mask[[i, j]]) {
            return Rgb([0, 0, 0]);
        }
        let unit = |k: usize| {
            if k < depth {
                (channels[[i, j, k]].clamp(0.0, 1.0) * 255.0) as u8
            } else {
                0
            }
        };
        Rgb([unit(2), unit(1), unit(0)])
    })
}

/// Stretch each channel to `[0, 1]` over the valid pixels.
fn normalized(data: &Array3<f64>, valid: &Array2<bool>) -> Array3<f64> {
    let (rows, cols, depth) = data.dim();
    let mut out = data.clone();
    for k in 0..depth {
        let values = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| (i, j)))
            .filter(|&(i, j)| valid[[i, j]])
            .map(|(i, j)| data[[i, j, k]]);
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let span = if max > min { max - min } else { 1.0 };
        out.slice_mut(ndarray::s![.., .., k])
            .mapv_inplace(|v| if min.is_finite() { (v - min) / span } else { 0.0 });
    }
    out
}

fn check_mask(mask: &Array2<bool>, rows: usize, cols: usize) -> Result<()> {
    if mask.dim() != (rows, cols) {
        return Err(WarpsynthError::InvalidShape {
            expected: format!("mask of shape ({rows}, {cols})"),
            actual: format!("{:?}", mask.dim()),
        });
    }
    Ok(())
}

#[instrument(skip(bm), fields(resolution = bm.resolution()))]
pub fn preview_backward_map(bm: &BackwardMap, size: u32, path: &Path) -> Result<()> {
    let data = bm.data().mapv(f64::from);
    save(pack(data.view(), None), size, path)
}

/// `valid` is the photo-space UV validity mask.
#[instrument(skip(angle, valid))]
pub fn preview_angle(angle: &WarpedAngle, valid: &Array2<bool>, size: u32, path: &Path) -> Result<()> {
    let data = angle.data().mapv(f64::from);
    check_mask(valid, data.dim().0, data.dim().1)?;
    save(pack(normalized(&data, valid).view(), Some(valid)), size, path)
}

/// Curvature in grey levels.
#[instrument(skip(curvature, valid))]
pub fn preview_curvature(
    curvature: &WarpedCurvature,
    valid: &Array2<bool>,
    size: u32,
    path: &Path,
) -> Result<()> {
    let data = curvature.data().mapv(f64::from);
    let (rows, cols, _) = data.dim();
    check_mask(valid, rows, cols)?;
    let grey = normalized(&data, valid);
    let replicated = Array3::from_shape_fn((rows, cols, 3), |(i, j, _)| grey[[i, j, 0]]);
    save(pack(replicated.view(), Some(valid)), size, path)
}

#[instrument(skip(mask))]
pub fn preview_text_mask(mask: &WarpedTextMask, size: u32, path: &Path) -> Result<()> {
    let data = mask.data();
    let (rows, cols, _) = data.dim();
    let replicated = Array3::from_shape_fn((rows, cols, 3), |(i, j, _)| {
        if data[[i, j, 0]] { 1.0 } else { 0.0 }
    });
    save(pack(replicated.view(), None), size, path)
}
