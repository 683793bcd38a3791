// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-sample pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WarpsynthError};

/// Settings for the dense ground-truth maps of one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Side length of the backward map and of the flat-page angle grid.
    pub resolution_bm: usize,
    /// Side length of the flat-page mesh used for curvature.
    pub curvature_resolution: usize,
    /// Fill backward-map cells outside the convex hull with nearest values.
    pub extrapolate_backward_map: bool,
    /// Box filter applied to the resampled text image.
    pub text_mask_blur: BlurKernel,
    /// Curvature values above this quantile of the positive values are clipped.
    pub curvature_clip_quantile: f64,
    /// Curvature values below this quantile of the positive values are zeroed.
    pub curvature_floor_quantile: f64,
}

/// A square box filter: every tap weighs `1 / divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurKernel {
    pub size: usize,
    pub divisor: f32,
}

impl Default for BlurKernel {
    fn default() -> Self {
        Self {
            size: 3,
            divisor: 25.0,
        }
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            resolution_bm: 512,
            curvature_resolution: 128,
            extrapolate_backward_map: true,
            text_mask_blur: BlurKernel::default(),
            curvature_clip_quantile: 0.99,
            curvature_floor_quantile: 0.5,
        }
    }
}

impl SampleConfig {
    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the generators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.resolution_bm < 2 {
            return Err(WarpsynthError::Config(format!(
                "resolution_bm must be at least 2, got {}",
                self.resolution_bm
            )));
        }
        if self.curvature_resolution < 2 {
            return Err(WarpsynthError::Config(format!(
                "curvature_resolution must be at least 2, got {}",
                self.curvature_resolution
            )));
        }
        if self.text_mask_blur.size % 2 == 0 || self.text_mask_blur.divisor <= 0.0 {
            return Err(WarpsynthError::Config(format!(
                "text_mask_blur needs an odd size and a positive divisor, got {:?}",
                self.text_mask_blur
            )));
        }
        for (name, q) in [
            ("curvature_clip_quantile", self.curvature_clip_quantile),
            ("curvature_floor_quantile", self.curvature_floor_quantile),
        ] {
            if !(0.0..=1.0).contains(&q) {
                return Err(WarpsynthError::Config(format!(
                    "{name} must lie in [0, 1], got {q}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SampleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolution_bm, 512);
        assert_eq!(config.curvature_resolution, 128);
    }

    /// Partial JSON files fall back to the defaults for missing keys.
    #[test]
    fn load_partial_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "resolution_bm": 64 }"#).expect("write");

        let config = SampleConfig::load(&path).expect("load");
        assert_eq!(config.resolution_bm, 64);
        assert!(config.extrapolate_backward_map);
        assert_eq!(config.text_mask_blur, BlurKernel::default());
    }

    #[test]
    fn rejects_even_blur_kernel() {
        let config = SampleConfig {
            text_mask_blur: BlurKernel {
                size: 4,
                divisor: 16.0,
            },
            ..SampleConfig::default()
        };
        assert!(matches!(config.validate(), Err(WarpsynthError::Config(_))));
    }
}
