// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warped text mask — which photo pixels show ink of the flat document.

use std::path::Path;

use image::RgbImage;
use ndarray::{Array3, Ix3};
use tracing::{info, instrument};
use warpsynth_core::config::BlurKernel;
use warpsynth_core::error::{Result, WarpsynthError};

use crate::archive::{expect_shape, read_bool, write_array};
use crate::curvature::reflect;
use crate::interp::SamplingGrid;
use crate::raster::UvRaster;

/// Inverted intensities of a text-only rendering: ink becomes bright.
fn inverted(text: &RgbImage) -> Array3<f64> {
    let (width, height) = text.dimensions();
    Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, k)| {
        f64::from(255 - text.get_pixel(x as u32, y as u32).0[k])
    })
}

/// Box filter with mirrored borders on an 8-bit image. Each output is the
/// tap sum divided by `divisor`, rounded and saturated to 8 bits.
pub fn box_blur(image: &Array3<u8>, kernel: &BlurKernel) -> Array3<u8> {
    let (rows, cols, channels) = image.dim();
    let radius = (kernel.size / 2) as isize;
    let weight = 1.0 / f64::from(kernel.divisor);

    Array3::from_shape_fn((rows, cols, channels), |(i, j, k)| {
        let mut sum = 0.0;
        for di in -radius..=radius {
            for dj in -radius..=radius {
                let y = reflect(i as isize + di, rows);
                let x = reflect(j as isize + dj, cols);
                sum += f64::from(image[[y, x, k]]) * weight;
            }
        }
        sum.round_ties_even().clamp(0.0, 255.0) as u8
    })
}

/// `H x W x 1` boolean mask in photo space.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpedTextMask {
    data: Array3<bool>,
}

impl WarpedTextMask {
    /// Resample the inverted text rendering into photo space, truncate to
    /// 8 bits, thicken strokes with a box blur and mark every pixel with a
    /// non-zero channel.
    #[instrument(skip_all, fields(height = uv.height(), width = uv.width()))]
    pub fn from_sources(uv: &UvRaster, text: &RgbImage, blur: &BlurKernel) -> Result<Self> {
        if text.width() == 0 || text.height() == 0 {
            return Err(WarpsynthError::InvalidShape {
                expected: "non-empty text rendering".to_string(),
                actual: format!("{} x {}", text.width(), text.height()),
            });
        }

        let warped = SamplingGrid::from_uv(uv).sample(&inverted(text));
        let quantized = warped.mapv(|v| v.clamp(0.0, 255.0) as u8);
        let blurred = box_blur(&quantized, blur);

        let (rows, cols, _) = blurred.dim();
        let data = Array3::from_shape_fn((rows, cols, 1), |(i, j, _)| {
            blurred.slice(ndarray::s![i, j, ..]).iter().any(|&v| v != 0)
        });
        let text_pixels = data.iter().filter(|v| **v).count();
        info!(text_pixels, "Warped text mask computed");
        Ok(Self { data })
    }

    pub fn new(data: Array3<bool>) -> Result<Self> {
        expect_shape(data.shape(), &[None, None, Some(1)], "text mask")?;
        Ok(Self { data })
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(read_bool::<Ix3>(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_array(path, &self.data)
    }

    pub fn data(&self) -> &Array3<bool> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{identity_uv, uv_from_fn};
    use image::Rgb;

    #[test]
    fn blank_page_gives_empty_mask() {
        let uv = identity_uv(10, 14).expect("uv");
        let text = RgbImage::from_pixel(20, 30, Rgb([255, 255, 255]));
        let mask = WarpedTextMask::from_sources(&uv, &text, &BlurKernel::default()).expect("mask");
        assert_eq!(mask.data().dim(), (10, 14, 1));
        assert!(mask.data().iter().all(|v| !v));
    }

    /// A single ink pixel grows into the 3x3 block around it.
    #[test]
    fn ink_dot_is_thickened() {
        let uv = identity_uv(12, 12).expect("uv");
        let mut text = RgbImage::from_pixel(12, 12, Rgb([255, 255, 255]));
        text.put_pixel(5, 5, Rgb([0, 0, 0]));

        let mask = WarpedTextMask::from_sources(&uv, &text, &BlurKernel::default()).expect("mask");
        let data = mask.data();
        assert!(data[[5, 5, 0]]);
        assert!(data[[4, 4, 0]]);
        assert!(data[[6, 6, 0]]);
        assert!(!data[[5, 7, 0]]);
        assert_eq!(data.iter().filter(|v| **v).count(), 9);
    }

    #[test]
    fn background_pixels_never_show_text() {
        let uv = uv_from_fn(4, 4, |_, _| [0.0, 0.5, 0.5]).expect("uv");
        let text = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let mask = WarpedTextMask::from_sources(&uv, &text, &BlurKernel::default()).expect("mask");
        assert!(mask.data().iter().all(|v| !v));
    }

    #[test]
    fn blur_rounds_and_mirrors() {
        let mut image = Array3::<u8>::zeros((3, 3, 1));
        image[[0, 0, 0]] = 25;
        let blurred = box_blur(&image, &BlurKernel::default());
        // Every window holding the corner once sums to 25 / 25.
        assert_eq!(blurred[[1, 1, 0]], 1);
        assert_eq!(blurred[[0, 0, 0]], 1);
        assert_eq!(blurred[[2, 2, 0]], 0);
    }
}
