// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Template-field pipeline — turns a colour-tagged rendering of a document
// template into one named rectangle per field.

use image::{Rgb, RgbImage};
use ndarray::Array2;
use tracing::{debug, info, instrument};
use warpsynth_core::{ColorKey, FieldLayout};

use super::corners::find_bounding_boxes;
use super::expand::expand_children;
use crate::rect::Rectangle;

/// Replace every pixel of each source colour with its destination colour.
///
/// Pairs mapping a colour onto itself are skipped. Pairs are applied in
/// order, so a later pair sees the output of an earlier one.
pub fn map_colors(image: &RgbImage, pairs: &[(ColorKey, ColorKey)]) -> RgbImage {
    let mut output = image.clone();
    for &(source, destination) in pairs.iter().filter(|(s, d)| s != d) {
        let destination = Rgb(destination.rgb());
        for pixel in output.pixels_mut() {
            if ColorKey::from_rgb(pixel.0) == source {
                *pixel = destination;
            }
        }
    }
    output
}

/// Pixels whose HSV value channel is below 255, i.e. no channel is fully
/// saturated. Anti-aliased borders and overlapping ink land here; flat tag
/// colours never do.
pub fn occlusion_mask(image: &RgbImage) -> Array2<bool> {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        let [r, g, b] = image.get_pixel(x as u32, y as u32).0;
        r.max(g).max(b) < 255
    })
}

/// Extract the named field rectangles of a colour-tagged template rendering.
///
/// Containers are located on a copy of the rendering in which every field
/// colour has been folded into its container colour (disconnected container
/// parts are allowed). Field anchors are located on the raw rendering, then
/// grown inside each container.
#[instrument(skip_all, fields(containers = layout.containers.len()))]
pub fn extract_template_fields(image: &RgbImage, layout: &FieldLayout) -> Vec<Rectangle> {
    let reduced = map_colors(image, &layout.reduction_pairs());
    let containers = find_bounding_boxes(&reduced, &layout.container_table(), true);
    let anchors = find_bounding_boxes(image, &layout.field_table(), false);
    let occlusion = occlusion_mask(image);
    debug!(
        containers = containers.len(),
        anchors = anchors.len(),
        "Layout boxes located"
    );

    let fields: Vec<Rectangle> = containers
        .iter()
        .flat_map(|container| expand_children(container, &anchors, &occlusion))
        .collect();

    info!(fields = fields.len(), "Template fields extracted");
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn fill(image: &mut RgbImage, y0: u32, x0: u32, y1: u32, x1: u32, rgb: [u8; 3]) {
        for y in y0..y1 {
            for x in x0..x1 {
                image.put_pixel(x, y, Rgb(rgb));
            }
        }
    }

    #[test]
    fn map_colors_replaces_exact_matches() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        image.put_pixel(1, 1, Rgb([0, 255, 0]));
        image.put_pixel(2, 2, Rgb([0, 254, 0]));

        let out = map_colors(&image, &[(ColorKey(0x00ff00), ColorKey(0xff0000))]);
        assert_eq!(out.get_pixel(1, 1).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(2, 2).0, [0, 254, 0]);
        // Input untouched.
        assert_eq!(image.get_pixel(1, 1).0, [0, 255, 0]);
    }

    #[test]
    fn occlusion_flags_unsaturated_pixels() {
        let mut image = RgbImage::from_pixel(3, 2, Rgb([0, 0, 255]));
        image.put_pixel(2, 1, Rgb([10, 200, 254]));
        let mask = occlusion_mask(&image);
        assert_eq!(mask.dim(), (2, 3));
        assert!(mask[[1, 2]]);
        assert_eq!(mask.iter().filter(|v| **v).count(), 1);
    }

    /// One white container holding two fields: both fields are returned,
    /// grown to fill the container without overlapping.
    #[test]
    fn extracts_fields_inside_container() {
        let container = [255, 255, 0];
        let mut image = RgbImage::from_pixel(60, 40, Rgb([255, 255, 255]));
        fill(&mut image, 5, 5, 35, 55, container);
        fill(&mut image, 10, 10, 14, 20, [0, 255, 0]);
        fill(&mut image, 10, 35, 14, 45, [0, 0, 255]);

        let layout = FieldLayout {
            containers: BTreeMap::from([(
                ColorKey::from_rgb(container),
                BTreeMap::from([
                    (ColorKey(0x00ff00), "invoice_number".to_string()),
                    (ColorKey(0x0000ff), "invoice_date".to_string()),
                ]),
            )]),
        };

        let fields = extract_template_fields(&image, &layout);
        assert_eq!(fields.len(), 2);
        let names: Vec<_> = fields.iter().filter_map(|f| f.name.as_deref()).collect();
        assert_eq!(names, vec!["invoice_date", "invoice_number"]);
        assert!(!fields[0].intersects(&fields[1]));

        let parent = Rectangle::from_corners(5.0, 5.0, 34.0, 54.0);
        for field in &fields {
            assert!(parent.contains(field));
        }
    }
}
