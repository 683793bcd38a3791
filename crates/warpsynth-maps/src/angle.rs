// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warped angle map — orientation of the warped page axes, per photo pixel.

use std::f64::consts::PI;
use std::path::Path;

use ndarray::{Array3, Ix3};
use tracing::{debug, info, instrument};
use warpsynth_core::error::Result;

use crate::archive::{expect_shape, read_float, write_array};
use crate::backward::synthesize;
use crate::interp::{SamplingGrid, fill_nan_nearest};
use crate::raster::UvRaster;

/// Shift `angle` by `offset` and wrap the result into `[-pi, pi)`.
fn rotate(angle: f64, offset: f64) -> f64 {
    (angle + PI + offset).rem_euclid(2.0 * PI) - PI
}

/// Phase of the offset `from - to` between two backward-map cells, read as
/// the complex number `d_col + i d_row`.
fn phase(from: (f64, f64), to: (f64, f64)) -> f64 {
    (from.0 - to.0).atan2(from.1 - to.1)
}

/// Angles of a backward map's page axes on the flat-page grid.
///
/// Channel 0 follows the grid's row direction (offset `+pi/2`), channel 1
/// its column direction (offset `-pi`); both read zero for an unwarped
/// page. Finite differences leave the last row and column undefined, so
/// they repeat their neighbours. Undefined input cells give NaN angles.
pub fn flat_angles(bm: &Array3<f64>) -> Array3<f64> {
    let (rows, cols, _) = bm.dim();
    let cell = |i: usize, j: usize| (bm[[i, j, 0]], bm[[i, j, 1]]);

    Array3::from_shape_fn((rows, cols, 2), |(i, j, k)| {
        let (i, j) = (i.min(rows.saturating_sub(2)), j.min(cols.saturating_sub(2)));
        if rows < 2 || cols < 2 {
            return 0.0;
        }
        match k {
            0 => rotate(phase(cell(i, j), cell(i + 1, j)), PI / 2.0),
            _ => rotate(phase(cell(i, j), cell(i, j + 1)), -PI),
        }
    })
}

/// `H x W x 2` angle map in photo space, channels `[row axis, column axis]`.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpedAngle {
    data: Array3<f32>,
}

impl WarpedAngle {
    /// Derive angles from a non-extrapolated backward map at `resolution`,
    /// fill undefined cells with their nearest defined neighbour and resample
    /// into photo space.
    #[instrument(skip(uv), fields(height = uv.height(), width = uv.width()))]
    pub fn from_uv(uv: &UvRaster, resolution: usize) -> Result<Self> {
        let bm = synthesize(uv, resolution, false)?;
        let mut angles = flat_angles(&bm);
        let filled = fill_nan_nearest(&mut angles)?;
        debug!(filled, "Undefined angle cells filled");

        let warped = SamplingGrid::from_uv(uv).sample(&angles);
        info!(resolution, "Warped angle map computed");
        Ok(Self {
            data: warped.mapv(|v| v as f32),
        })
    }

    pub fn new(data: Array3<f32>) -> Result<Self> {
        expect_shape(data.shape(), &[None, None, Some(2)], "angle map")?;
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
