// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay drawing — renders located fields and words on top of the flat
// document rendering for visual inspection.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{info, instrument};
use warpsynth_core::error::{Result, WarpsynthError};

use crate::fields::record::FieldRecord;
use crate::palette::color_range;
use crate::pdf::words::WordRecord;
use crate::rect::Rectangle;

/// Outline colour for rectangles without a colour of their own.
const DEFAULT_OUTLINE: Rgb<u8> = Rgb([235, 174, 52]);

/// Fill colour blended under words.
const WORD_HIGHLIGHT: Rgb<u8> = Rgb([209, 0, 0]);

fn to_rect(rect: &Rectangle) -> Rect {
    Rect::at(rect.left as i32, rect.top as i32).of_size(
        (rect.width as u32).max(1),
        (rect.height as u32).max(1),
    )
}

/// Draw the outline of each rectangle, in its tag colour when it has one.
pub fn draw_outlines(image: &mut RgbImage, rects: &[Rectangle]) {
    for rect in rects {
        let color = rect.color.map(|c| Rgb(c.rgb())).unwrap_or(DEFAULT_OUTLINE);
        draw_hollow_rect_mut(image, to_rect(rect), color);
    }
}

/// Blend `color` 50/50 into the pixels under `rect` and outline it.
pub fn highlight(image: &mut RgbImage, rect: &Rectangle, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let bounds = Rectangle::new(0.0, 0.0, f64::from(height), f64::from(width));
    if !bounds.intersects(rect) {
        return;
    }
    let clipped = rect.constrain(&bounds);
    for y in clipped.top as u32..(clipped.y1() as u32).min(height) {
        for x in clipped.left as u32..(clipped.x1() as u32).min(width) {
            let pixel = image.get_pixel_mut(x, y);
            for (channel, tint) in pixel.0.iter_mut().zip(color.0) {
                *channel = ((u16::from(*channel) + u16::from(tint) + 1) / 2) as u8;
            }
        }
    }
    draw_hollow_rect_mut(image, to_rect(rect), color);
}

fn open_background(background: &Path) -> Result<RgbImage> {
    Ok(image::open(background)
        .map_err(|err| WarpsynthError::Image(format!("cannot open {}: {err}", background.display())))?
        .to_rgb8())
}

fn save(image: &RgbImage, output: &Path) -> Result<()> {
    image
        .save(output)
        .map_err(|err| WarpsynthError::Image(format!("cannot write {}: {err}", output.display())))
}

/// Draw field records over `background`, one palette colour per field.
#[instrument(skip(records), fields(count = records.len()))]
pub fn visualize_fields(records: &[FieldRecord], background: &Path, output: &Path) -> Result<()> {
    let mut image = open_background(background)?;
    let palette = color_range(records.len())?;
    let rects: Vec<Rectangle> = records
        .iter()
        .zip(palette)
        .map(|(record, color)| record.rectangle().with_color(Some(color)))
        .collect();
    draw_outlines(&mut image, &rects);
    save(&image, output)?;
    info!(output = %output.display(), "Field overlay written");
    Ok(())
}

/// Highlight word records over `background`.
#[instrument(skip(records), fields(count = records.len()))]
pub fn visualize_words(records: &[WordRecord], background: &Path, output: &Path) -> Result<()> {
    let mut image = open_background(background)?;
    for record in records {
        let rect = Rectangle::new(
            record.top as f64,
            record.left as f64,
            record.height as f64,
            record.width as f64,
        );
        highlight(&mut image, &rect, WORD_HIGHLIGHT);
    }
    save(&image, output)?;
    info!(output = %output.display(), "Word overlay written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpsynth_core::ColorKey;

    #[test]
    fn outline_uses_tag_colour() {
        let mut image = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        let rect = Rectangle::new(5.0, 5.0, 6.0, 8.0).with_color(Some(ColorKey(0x00ff00)));
        draw_outlines(&mut image, &[rect]);
        assert_eq!(image.get_pixel(5, 5).0, [0, 255, 0]);
        assert_eq!(image.get_pixel(12, 10).0, [0, 255, 0]);
        assert_eq!(image.get_pixel(8, 8).0, [255, 255, 255]);
    }

    #[test]
    fn highlight_blends_interior() {
        let mut image = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        highlight(&mut image, &Rectangle::new(2.0, 2.0, 10.0, 10.0), Rgb([1, 1, 1]));
        assert_eq!(image.get_pixel(6, 6).0, [128, 128, 128]);
        assert_eq!(image.get_pixel(15, 15).0, [255, 255, 255]);
    }

    #[test]
    fn highlight_outside_image_is_ignored() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]));
        highlight(&mut image, &Rectangle::new(10.0, 10.0, 2.0, 2.0), Rgb([0, 0, 0]));
        assert!(image.pixels().all(|p| p.0 == [9, 9, 9]));
    }

    #[test]
    fn field_overlay_written_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let background = dir.path().join("flat_document.png");
        let output = dir.path().join("fields.png");
        RgbImage::from_pixel(30, 30, Rgb([255, 255, 255]))
            .save(&background)
            .expect("write background");

        let records = vec![FieldRecord {
            tag: "total".into(),
            value: None,
            top: 2,
            left: 3,
            height: 10,
            width: 10,
        }];
        visualize_fields(&records, &background, &output).expect("visualize");
        let drawn = image::open(&output).expect("open").to_rgb8();
        assert_eq!(drawn.get_pixel(3, 2).0, [255, 0, 0]);
    }
}
