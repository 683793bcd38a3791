// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Renderer rasters — the UV correspondence raster and the world-position
// raster of the warped photo.

use std::path::Path;

use ndarray::{Array2, Array3, Ix3};
use tracing::{debug, instrument};
use warpsynth_core::error::{Result, WarpsynthError};

use crate::archive::{expect_shape, read_float};

/// A UV pixel is valid when its first channel exceeds this value.
pub const VALIDITY_THRESHOLD: f64 = 0.5;

/// `H x W x 3` correspondence raster: validity, then the flat-page texture
/// coordinate `(v, u)` with `v` measured from the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct UvRaster {
    data: Array3<f64>,
}

impl UvRaster {
    pub fn new(data: Array3<f64>) -> Result<Self> {
        expect_shape(data.shape(), &[None, None, Some(3)], "UV raster")?;
        Ok(Self { data })
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(read_float::<Ix3>(path)?)
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.data[[row, col, 0]] > VALIDITY_THRESHOLD
    }

    /// Flat-page texture coordinate of a pixel as `(row, col)` fractions
    /// with the row measured from the top of the page.
    pub fn texture_coordinate(&self, row: usize, col: usize) -> [f64; 2] {
        [1.0 - self.data[[row, col, 1]], self.data[[row, col, 2]]]
    }

    /// Valid pixels in raster order.
    pub fn valid_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width();
        (0..self.height() * width)
            .map(move |index| (index / width, index % width))
            .filter(|&(row, col)| self.is_valid(row, col))
    }

    pub fn validity_mask(&self) -> Array2<bool> {
        Array2::from_shape_fn((self.height(), self.width()), |(row, col)| {
            self.is_valid(row, col)
        })
    }

    /// Scattered samples: texture coordinates of the valid pixels paired with
    /// `value(row, col)`. Fails when no pixel is valid.
    pub fn scattered<const N: usize>(
        &self,
        mut value: impl FnMut(usize, usize) -> [f64; N],
    ) -> Result<(Vec<[f64; 2]>, Vec<[f64; N]>)> {
        let (points, values): (Vec<_>, Vec<_>) = self
            .valid_pixels()
            .map(|(row, col)| (self.texture_coordinate(row, col), value(row, col)))
            .unzip();
        if points.is_empty() {
            return Err(WarpsynthError::Interpolation(
                "UV raster has no valid pixels".to_string(),
            ));
        }
        debug!(valid = points.len(), "Scattered samples collected");
        Ok((points, values))
    }
}

/// `H x W x 3` world positions, index-aligned with a UV raster.
#[derive(Debug, Clone, PartialEq)]
pub struct WcRaster {
    data: Array3<f64>,
}

impl WcRaster {
    pub fn new(data: Array3<f64>, uv: &UvRaster) -> Result<Self> {
        expect_shape(
            data.shape(),
            &[Some(uv.height()), Some(uv.width()), Some(3)],
            "WC raster aligned with the UV raster",
        )?;
        Ok(Self { data })
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>, uv: &UvRaster) -> Result<Self> {
        Self::new(read_float::<Ix3>(path)?, uv)
    }

    pub fn position(&self, row: usize, col: usize) -> [f64; 3] {
        [
            self.data[[row, col, 0]],
            self.data[[row, col, 1]],
            self.data[[row, col, 2]],
        ]
    }
}

/// Build a UV raster from a closure over `(row, col)` returning
/// `[validity, v, u]`. Test and benchmark helper.
pub fn uv_from_fn(
    height: usize,
    width: usize,
    f: impl Fn(usize, usize) -> [f64; 3],
) -> Result<UvRaster> {
    UvRaster::new(Array3::from_shape_fn((height, width, 3), |(row, col, k)| {
        f(row, col)[k]
    }))
}

/// UV raster whose texture coordinates span the flat page exactly:
/// pixel `(r, c)` shows the page point `(r / (H - 1), c / (W - 1))`.
pub fn identity_uv(height: usize, width: usize) -> Result<UvRaster> {
    uv_from_fn(height, width, |row, col| {
        [
            1.0,
            1.0 - row as f64 / (height - 1) as f64,
            col as f64 / (width - 1) as f64,
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_channel_count_rejected() {
        let err = UvRaster::new(Array3::zeros((4, 4, 2))).unwrap_err();
        assert!(matches!(err, WarpsynthError::InvalidShape { .. }));
    }

    #[test]
    fn texture_coordinate_flips_rows() {
        let uv = identity_uv(5, 3).expect("uv");
        assert_eq!(uv.texture_coordinate(0, 0), [0.0, 0.0]);
        assert_eq!(uv.texture_coordinate(4, 2), [1.0, 1.0]);
    }

    #[test]
    fn validity_threshold_is_exclusive() {
        let uv = uv_from_fn(1, 3, |_, col| [[0.5, 0.0, 0.0], [0.51, 0.0, 0.0], [0.0, 0.0, 0.0]][col])
            .expect("uv");
        let valid: Vec<_> = uv.valid_pixels().collect();
        assert_eq!(valid, vec![(0, 1)]);
    }

    #[test]
    fn empty_coverage_is_an_error() {
        let uv = uv_from_fn(2, 2, |_, _| [0.0, 0.5, 0.5]).expect("uv");
        assert!(uv.scattered(|r, c| [r as f64, c as f64]).is_err());
    }

    #[test]
    fn wc_must_align_with_uv() {
        let uv = identity_uv(4, 4).expect("uv");
        assert!(WcRaster::new(Array3::zeros((4, 4, 3)), &uv).is_ok());
        assert!(WcRaster::new(Array3::zeros((4, 5, 3)), &uv).is_err());
    }
}
