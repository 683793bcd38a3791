// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warped curvature map — a discrete Laplacian of the 3D page surface,
// resampled into photo space and denoised by quantile thresholds.

use std::path::Path;

use ndarray::{Array2, Array3, Ix3};
use tracing::{debug, info, instrument, warn};
use warpsynth_core::SampleConfig;
use warpsynth_core::error::Result;

use crate::archive::{expect_shape, read_float, write_array};
use crate::interp::{SamplingGrid, ScatteredInterpolator};
use crate::raster::{UvRaster, WcRaster};

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge element.
pub(crate) fn reflect(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let folded = index.rem_euclid(period);
    if folded < len as isize {
        folded as usize
    } else {
        (period - folded) as usize
    }
}

/// Norm of the summed offsets from each mesh node to its four axis
/// neighbours, with the mesh mirrored at its border.
pub fn mesh_curvature(mesh: &Array3<f64>) -> Array2<f64> {
    let (rows, cols, dims) = mesh.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        let neighbours = [
            (i as isize, j as isize + 1),
            (i as isize, j as isize - 1),
            (i as isize + 1, j as isize),
            (i as isize - 1, j as isize),
        ];
        let mut sum = vec![0.0; dims];
        for (ni, nj) in neighbours {
            let (ni, nj) = (reflect(ni, rows), reflect(nj, cols));
            for (k, slot) in sum.iter_mut().enumerate() {
                *slot += mesh[[i, j, k]] - mesh[[ni, nj, k]];
            }
        }
        sum.iter().map(|v| v * v).sum::<f64>().sqrt()
    })
}

/// Quantile of ascending `sorted` values with linear interpolation between
/// order statistics.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let position = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = position.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            let fraction = position - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

fn sorted_positive(values: &Array3<f64>) -> Vec<f64> {
    let mut positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    positive.sort_by(f64::total_cmp);
    positive
}

/// Clip values above the `clip_q` quantile of the positive values, then zero
/// values below the `floor_q` quantile of the (clipped) positive values.
/// Returns `false` when there is nothing positive to threshold.
pub fn suppress_noise(values: &mut Array3<f64>, clip_q: f64, floor_q: f64) -> bool {
    let positive = sorted_positive(values);
    if positive.is_empty() {
        return false;
    }
    let ceiling = quantile(&positive, clip_q);
    values.mapv_inplace(|v| if v > ceiling { ceiling } else { v });

    let floor = quantile(&sorted_positive(values), floor_q);
    values.mapv_inplace(|v| if v < floor { 0.0 } else { v });
    debug!(ceiling, floor, "Curvature thresholds applied");
    true
}

/// `H x W x 1` curvature map in photo space.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpedCurvature {
    data: Array3<f32>,
}

impl WarpedCurvature {
    /// Interpolate the 3D positions of the valid pixels onto a flat-page
    /// mesh, take the mesh curvature, resample it into photo space and
    /// threshold it.
    #[instrument(skip_all, fields(height = uv.height(), width = uv.width()))]
    pub fn from_sources(uv: &UvRaster, wc: &WcRaster, config: &SampleConfig) -> Result<Self> {
        let (points, positions) = uv.scattered(|row, col| wc.position(row, col))?;
        let interpolator = ScatteredInterpolator::new(&points, positions)?;
        let mesh = interpolator.onto_unit_grid(config.curvature_resolution, true);

        let curvature = mesh_curvature(&mesh).insert_axis(ndarray::Axis(2));
        let mut warped = SamplingGrid::from_uv(uv).sample(&curvature);

        if !suppress_noise(
            &mut warped,
            config.curvature_clip_quantile,
            config.curvature_floor_quantile,
        ) {
            warn!("No positive curvature in photo space; thresholds skipped");
        }

        info!(resolution = config.curvature_resolution, "Warped curvature map computed");
        Ok(Self {
            data: warped.mapv(|v| v as f32),
        })
    }

    pub fn new(data: Array3<f32>) -> Result<Self> {
        expect_shape(data.shape(), &[None, None, Some(1)], "curvature map")?;
        Ok(Self { data })
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(read_float::<Ix3>(path)?.mapv(|v| v as f32))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_array(path, &self.data)
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }
}
