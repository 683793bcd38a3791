// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// warpsynth-maps — Dense ground-truth maps for the Warpsynth pipeline.
//
// Provides single-array archive I/O, scattered interpolation and regular-grid
// resampling, the backward-map synthesizer, the warped angle, curvature and
// text-mask generators, PNG previews and the per-sample digest manifest.

pub mod angle;
pub mod archive;
pub mod backward;
pub mod curvature;
pub mod interp;
pub mod manifest;
pub mod pipeline;
pub mod preview;
pub mod raster;
pub mod text_mask;

// Re-export the primary structs so callers can use `warpsynth_maps::BackwardMap` etc.
pub use angle::WarpedAngle;
pub use backward::BackwardMap;
pub use curvature::WarpedCurvature;
pub use interp::{SamplingGrid, ScatteredInterpolator};
pub use manifest::Manifest;
pub use pipeline::{create_supplementary, render_previews};
pub use raster::{UvRaster, WcRaster};
pub use text_mask::WarpedTextMask;
