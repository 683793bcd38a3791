// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backward-map synthesis — inverts the UV raster into a dense flat-page to
// photo sampling grid.

use std::path::Path;

use ndarray::{Array3, Ix3};
use tracing::{info, instrument};
use warpsynth_core::error::{Result, WarpsynthError};

use crate::archive::{expect_shape, read_float, write_array};
use crate::interp::ScatteredInterpolator;
use crate::raster::UvRaster;

/// `R x R x 2` backward map. Cell `(i, j)` of the flat-page grid holds the
/// photo position `(row, col)` it is seen at, as fractions of the photo
/// height and width.
#[derive(Debug, Clone, PartialEq)]
pub struct BackwardMap {
    data: Array3<f32>,
}

/// Interpolate the photo positions of the valid UV pixels onto the flat-page
/// grid. Without extrapolation, cells outside the covered region are NaN.
pub(crate) fn synthesize(uv: &UvRaster, resolution: usize, extrapolate: bool) -> Result<Array3<f64>> {
    if resolution < 2 {
        return Err(WarpsynthError::Config(format!(
            "backward-map resolution must be at least 2, got {resolution}"
        )));
    }
    let (height, width) = (uv.height() as f64, uv.width() as f64);
    let (points, values) = uv.scattered(|row, col| [row as f64 / height, col as f64 / width])?;
    let interpolator = ScatteredInterpolator::new(&points, values)?;
    Ok(interpolator.onto_unit_grid(resolution, extrapolate))
}

impl BackwardMap {
    #[instrument(skip(uv), fields(height = uv.height(), width = uv.width()))]
    pub fn from_uv(uv: &UvRaster, resolution: usize, extrapolate: bool) -> Result<Self> {
        let grid = synthesize(uv, resolution, extrapolate)?;
        let undefined = grid.iter().filter(|v| v.is_nan()).count();
        info!(resolution, undefined, "Backward map synthesized");
        Ok(Self {
            data: grid.mapv(|v| v as f32),
        })
    }

    pub fn new(data: Array3<f32>) -> Result<Self> {
        let side = data.dim().0;
        expect_shape(data.shape(), &[Some(side), Some(side), Some(2)], "backward map")?;
        Ok(Self { data })
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(read_float::<Ix3>(path)?.mapv(|v| v as f32))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_array(path, &self.data)
    }

    pub fn resolution(&self) -> usize {
        self.data.dim().0
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn is_total(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{identity_uv, uv_from_fn};

    /// Full coverage with an affine correspondence: every cell equals the
    /// inverse affine map. Pixel `(r, c)` shows page point
    /// `(r / (H-1), c / (W-1))`, so cell `(y, x)` must hold
    /// `(y (H-1) / H, x (W-1) / W)`.
    #[test]
    fn affine_uv_gives_inverse_affine_map() {
        let (height, width, resolution) = (9usize, 13usize, 7usize);
        let uv = identity_uv(height, width).expect("uv");
        let grid = synthesize(&uv, resolution, true).expect("bm");

        for i in 0..resolution {
            for j in 0..resolution {
                let y = i as f64 / (resolution - 1) as f64;
                let x = j as f64 / (resolution - 1) as f64;
                let expected_row = y * (height - 1) as f64 / height as f64;
                let expected_col = x * (width - 1) as f64 / width as f64;
                assert!((grid[[i, j, 0]] - expected_row).abs() < 1e-9, "row at {i},{j}");
                assert!((grid[[i, j, 1]] - expected_col).abs() < 1e-9, "col at {i},{j}");
            }
        }
    }

    /// Sparse coverage (a central disc of the photo) still yields a total
    /// map when extrapolating, and holes when not.
    #[test]
    fn sparse_coverage_is_filled() {
        let n = 24usize;
        let uv = uv_from_fn(n, n, |r, c| {
            let (dy, dx) = (r as f64 - 11.5, c as f64 - 11.5);
            let valid = if dy * dy + dx * dx < 64.0 { 1.0 } else { 0.0 };
            [valid, 1.0 - r as f64 / (n - 1) as f64, c as f64 / (n - 1) as f64]
        })
        .expect("uv");

        let bm = BackwardMap::from_uv(&uv, 16, true).expect("bm");
        assert_eq!(bm.resolution(), 16);
        assert!(bm.is_total());

        let holes = BackwardMap::from_uv(&uv, 16, false).expect("bm");
        assert!(!holes.is_total());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("warped_BM.npz");
        let bm = BackwardMap::from_uv(&identity_uv(5, 5).expect("uv"), 4, true).expect("bm");
        bm.save(&path).expect("save");
        assert_eq!(BackwardMap::load(&path).expect("load"), bm);
    }

    #[test]
    fn non_square_rejected() {
        assert!(BackwardMap::new(Array3::zeros((4, 5, 2))).is_err());
        assert!(BackwardMap::new(Array3::zeros((4, 4, 3))).is_err());
    }

    #[test]
    fn tiny_resolution_rejected() {
        let uv = identity_uv(3, 3).expect("uv");
        assert!(matches!(
            BackwardMap::from_uv(&uv, 1, true),
            Err(WarpsynthError::Config(_))
        ));
    }
}
