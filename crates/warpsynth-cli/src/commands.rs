// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command implementations — each subcommand loads its inputs, calls into the
// layout and map crates and writes the ground-truth files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, instrument, warn};
use warpsynth_core::error::{Result, WarpsynthError};
use warpsynth_core::{FieldLayout, SampleConfig, files};
use warpsynth_layout::fields::write_field_records;
use warpsynth_layout::pdf::write_word_records;
use warpsynth_layout::visualize::{visualize_fields, visualize_words};
use warpsynth_layout::{WordLocator, extract_template_fields, field_records, word_records};
use warpsynth_maps::{Manifest, create_supplementary, render_previews};

/// Pixel grid the word boxes are expressed in.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterTarget {
    /// Take the size of an existing rendering.
    Image(PathBuf),
    Size { height: u32, width: u32 },
}

impl RasterTarget {
    /// `(height, width)` in pixels.
    fn dimensions(&self) -> Result<(u32, u32)> {
        match self {
            Self::Image(path) => {
                let (width, height) = image::image_dimensions(path).map_err(|err| {
                    WarpsynthError::Image(format!("cannot read {}: {err}", path.display()))
                })?;
                Ok((height, width))
            }
            Self::Size { height, width } => Ok((*height, *width)),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<SampleConfig> {
    match path {
        Some(path) => SampleConfig::load(path),
        None => Ok(SampleConfig::default()),
    }
}

fn load_values(path: Option<&Path>) -> Result<BTreeMap<String, Value>> {
    match path {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(BTreeMap::new()),
    }
}

fn open_rgb(path: &Path) -> Result<image::RgbImage> {
    Ok(image::open(path)
        .map_err(|err| WarpsynthError::Image(format!("cannot open {}: {err}", path.display())))?
        .to_rgb8())
}

// -- Subcommands ---------------------------------------------------------------

/// Extract field boxes from `template` and write their records to `output`.
/// With `overlay = (background, preview)` the boxes are also drawn.
#[instrument(skip_all, fields(template = %template.display()))]
pub fn fields(
    template: &Path,
    layout: &Path,
    values: Option<&Path>,
    output: &Path,
    overlay: Option<(PathBuf, PathBuf)>,
) -> Result<()> {
    let layout = FieldLayout::load(layout)?;
    let values = load_values(values)?;
    let image = open_rgb(template)?;

    let records = field_records(&extract_template_fields(&image, &layout), &values);
    let expected = layout.field_table().len();
    if records.len() < expected {
        warn!(found = records.len(), expected, "Some layout fields were not found");
    }
    write_field_records(output, &records)?;

    if let Some((background, preview)) = overlay {
        visualize_fields(&records, &background, &preview)?;
    }
    info!(fields = records.len(), output = %output.display(), "Field ground truth written");
    Ok(())
}

/// Locate the words of `pdf` in the pixel grid of `target` and write their
/// records to `output`.
#[instrument(skip_all, fields(pdf = %pdf.display()))]
pub fn words(pdf: &Path, target: &RasterTarget, output: &Path, preview: Option<&Path>) -> Result<()> {
    let (height, width) = target.dimensions()?;
    let locator = WordLocator::from_path(pdf)?;
    let records = word_records(&locator.words(), height, width);
    write_word_records(output, &records)?;

    if let Some(preview) = preview {
        match target {
            RasterTarget::Image(background) => visualize_words(&records, background, preview)?,
            RasterTarget::Size { .. } => warn!("Word preview needs a raster; skipped"),
        }
    }
    info!(words = records.len(), height, width, "Word ground truth written");
    Ok(())
}

/// Compute the dense maps of `sample_dir`, optionally rendering previews.
#[instrument(skip(config))]
pub fn maps(
    sample_dir: &Path,
    config: &SampleConfig,
    preview_dir: Option<&Path>,
    preview_size: u32,
) -> Result<()> {
    let manifest = create_supplementary(sample_dir, config)?;
    if let Some(dir) = preview_dir {
        std::fs::create_dir_all(dir)?;
        render_previews(sample_dir, dir, preview_size)?;
    }
    info!(files = manifest.files.len(), "Map ground truth written");
    Ok(())
}

/// All ground truth of one sample directory: field tags from the template
/// structure rendering, words from the flat PDF and the dense maps.
#[instrument(skip(config, values))]
pub fn sample(
    sample_dir: &Path,
    layout: &Path,
    values: Option<&Path>,
    config: &SampleConfig,
) -> Result<()> {
    config.validate()?;
    fields(
        &sample_dir.join(files::FLAT_TEMPLATE_STRUCTURE),
        layout,
        values,
        &sample_dir.join(files::GROUND_TRUTH_TAGS),
        None,
    )?;
    words(
        &sample_dir.join(files::FLAT_DOCUMENT_PDF),
        &RasterTarget::Image(sample_dir.join(files::FLAT_DOCUMENT_PNG)),
        &sample_dir.join(files::GROUND_TRUTH_WORDS),
        None,
    )?;
    maps(sample_dir, config, None, 0)?;
    info!("Sample ground truth complete");
    Ok(())
}

/// Re-hash the map archives of `sample_dir` against its manifest.
#[instrument]
pub fn verify(sample_dir: &Path) -> Result<()> {
    Manifest::load(sample_dir.join(files::GROUND_TRUTH_MANIFEST))?.verify(sample_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use warpsynth_layout::fields::read_field_records;

    fn fill(image: &mut RgbImage, y0: u32, x0: u32, y1: u32, x1: u32, rgb: [u8; 3]) {
        for y in y0..y1 {
            for x in x0..x1 {
                image.put_pixel(x, y, Rgb(rgb));
            }
        }
    }

    /// Template with one yellow container holding a green and a blue field.
    fn write_template(dir: &Path) -> (PathBuf, PathBuf) {
        let mut image = RgbImage::from_pixel(60, 40, Rgb([255, 255, 255]));
        fill(&mut image, 5, 5, 35, 55, [255, 255, 0]);
        fill(&mut image, 10, 10, 14, 20, [0, 255, 0]);
        fill(&mut image, 10, 35, 14, 45, [0, 0, 255]);
        let template = dir.join("template.png");
        image.save(&template).expect("template");

        let layout = dir.join("layout.json");
        std::fs::write(
            &layout,
            r##"{"containers": {"#ffff00": {"#00ff00": "invoice_number", "#0000ff": "invoice_date"}}}"##,
        )
        .expect("layout");
        (template, layout)
    }

    #[test]
    fn fields_writes_records_and_overlay() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (template, layout) = write_template(dir.path());
        let values = dir.path().join("values.json");
        std::fs::write(&values, r#"{"invoice_number": "A-17", "invoice_date": null}"#).expect("values");
        let output = dir.path().join("tags.json");
        let preview = dir.path().join("tags.png");

        fields(
            &template,
            &layout,
            Some(&values),
            &output,
            Some((template.clone(), preview.clone())),
        )
        .expect("fields");

        let records = read_field_records(&output).expect("records");
        let tags: Vec<_> = records.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["invoice_date", "invoice_number"]);
        assert_eq!(records[0].value, None);
        assert_eq!(records[1].value, Some(Value::from("A-17")));
        assert!(preview.is_file());
    }

    #[test]
    fn raster_size_read_from_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.png");
        RgbImage::new(30, 20).save(&path).expect("save");
        assert_eq!(RasterTarget::Image(path).dimensions().expect("size"), (20, 30));
        let fixed = RasterTarget::Size { height: 8, width: 6 };
        assert_eq!(fixed.dimensions().expect("size"), (8, 6));
    }

    #[test]
    fn missing_config_gives_defaults() {
        assert_eq!(load_config(None).expect("config"), SampleConfig::default());
    }

    #[test]
    fn verify_without_manifest_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(verify(dir.path()), Err(WarpsynthError::Io(_))));
    }

    #[test]
    fn verify_accepts_untouched_archives() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(files::WARPED_BM), b"bm").expect("write");
        Manifest::build(dir.path(), &[files::WARPED_BM])
            .expect("build")
            .write(dir.path().join(files::GROUND_TRUTH_MANIFEST))
            .expect("manifest");
        verify(dir.path()).expect("verify");

        std::fs::write(dir.path().join(files::WARPED_BM), b"changed").expect("rewrite");
        assert!(matches!(
            verify(dir.path()),
            Err(WarpsynthError::IntegrityMismatch { .. })
        ));
    }
}
