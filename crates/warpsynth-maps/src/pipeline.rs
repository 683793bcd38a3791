// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sample pipeline — derives every dense map of one sample directory from the
// renderer outputs and records their digests.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};
use warpsynth_core::SampleConfig;
use warpsynth_core::error::{Result, WarpsynthError};
use warpsynth_core::files;

use crate::angle::WarpedAngle;
use crate::backward::BackwardMap;
use crate::curvature::WarpedCurvature;
use crate::manifest::Manifest;
use crate::preview;
use crate::raster::{UvRaster, WcRaster};
use crate::text_mask::WarpedTextMask;

/// Files written by [`create_supplementary`], in writing order.
pub const MAP_FILES: [&str; 4] = [
    files::WARPED_BM,
    files::WARPED_CURVATURE,
    files::WARPED_ANGLE,
    files::WARPED_TEXT_MASK,
];

fn input(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(WarpsynthError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("missing sample input {}", path.display()),
        )));
    }
    Ok(path)
}

/// Compute the backward map, curvature, angle and text-mask archives of
/// `sample_dir` and write a manifest of their digests next to them.
///
/// Reads `warped_UV.npz`, `warped_WC.npz` and `flat_text_mask.png`.
#[instrument(skip(config), fields(dir = %sample_dir.display()))]
pub fn create_supplementary(sample_dir: &Path, config: &SampleConfig) -> Result<Manifest> {
    config.validate()?;
    let uv_path = input(sample_dir, files::WARPED_UV)?;
    let wc_path = input(sample_dir, files::WARPED_WC)?;
    let text_path = input(sample_dir, files::FLAT_TEXT_MASK)?;
    info!("Supplementary generation started");

    let uv = UvRaster::load(&uv_path)?;
    let wc = WcRaster::load(&wc_path, &uv)?;
    let text = image::open(&text_path)
        .map_err(|err| WarpsynthError::Image(format!("cannot open {}: {err}", text_path.display())))?
        .to_rgb8();

    BackwardMap::from_uv(&uv, config.resolution_bm, config.extrapolate_backward_map)?
        .save(sample_dir.join(files::WARPED_BM))?;
    WarpedCurvature::from_sources(&uv, &wc, config)?.save(sample_dir.join(files::WARPED_CURVATURE))?;
    WarpedAngle::from_uv(&uv, config.resolution_bm)?.save(sample_dir.join(files::WARPED_ANGLE))?;
    WarpedTextMask::from_sources(&uv, &text, &config.text_mask_blur)?
        .save(sample_dir.join(files::WARPED_TEXT_MASK))?;

    let manifest = Manifest::build(sample_dir, &MAP_FILES)?;
    manifest.write(sample_dir.join(files::GROUND_TRUTH_MANIFEST))?;
    info!(files = manifest.files.len(), "Supplementary generation finished");
    Ok(manifest)
}

/// Render PNG previews of the maps of `sample_dir` into `output_dir`, the
/// longer side of each image scaled to `size`.
#[instrument(fields(dir = %sample_dir.display()))]
pub fn render_previews(sample_dir: &Path, output_dir: &Path, size: u32) -> Result<()> {
    let uv = UvRaster::load(input(sample_dir, files::WARPED_UV)?)?;
    let valid = uv.validity_mask();

    let bm = BackwardMap::load(input(sample_dir, files::WARPED_BM)?)?;
    preview::preview_backward_map(&bm, size, &output_dir.join("warped_BM.png"))?;

    let angle = WarpedAngle::load(input(sample_dir, files::WARPED_ANGLE)?)?;
    preview::preview_angle(&angle, &valid, size, &output_dir.join("warped_angle.png"))?;

    let curvature = WarpedCurvature::load(input(sample_dir, files::WARPED_CURVATURE)?)?;
    preview::preview_curvature(&curvature, &valid, size, &output_dir.join("warped_curvature.png"))?;

    let mask = WarpedTextMask::load(input(sample_dir, files::WARPED_TEXT_MASK)?)?;
    preview::preview_text_mask(&mask, size, &output_dir.join("warped_text_mask.png"))?;

    info!(output = %output_dir.display(), "Previews written");
    Ok(())
}
