// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tag palette — evenly spaced, fully saturated hues for colour-tagging
// template fields.

use std::collections::BTreeSet;

use warpsynth_core::ColorKey;
use warpsynth_core::error::{Result, WarpsynthError};

/// HSV to RGB with every component in `[0, 1]`.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// `count` colours with hues `i / count`, full saturation and value.
///
/// Components are truncated to 8 bits. Fails when truncation makes two
/// colours collide, which bounds `count` to the number of distinct
/// saturated 8-bit hues.
pub fn color_range(count: usize) -> Result<Vec<ColorKey>> {
    let colors: Vec<ColorKey> = (0..count)
        .map(|i| {
            let (r, g, b) = hsv_to_rgb(i as f64 / count as f64, 1.0, 1.0);
            ColorKey::from_rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
        })
        .collect();

    let unique: BTreeSet<_> = colors.iter().collect();
    if unique.len() != colors.len() {
        return Err(WarpsynthError::Layout(format!(
            "palette of {count} colours is not unique at 8-bit precision"
        )));
    }
    Ok(colors)
}
