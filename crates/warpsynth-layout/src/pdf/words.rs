// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word Locator — groups page glyphs into lines and words and reports each
// word's box as fractions of the page.

use std::path::Path;

use lopdf::Document;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use warpsynth_core::error::{Result, WarpsynthError};

use super::glyphs::{Glyph, PageGlyphs, first_page_glyphs};
use crate::rect::Rectangle;

/// Consecutive glyphs share a line when their vertical overlap exceeds this
/// fraction of the smaller height.
const LINE_OVERLAP: f64 = 0.5;

/// Consecutive glyphs share a line when their horizontal distance is below
/// this multiple of the larger width.
const CHAR_MARGIN: f64 = 2.0;

/// A gap wider than this fraction of the glyph's larger side separates words.
const WORD_MARGIN: f64 = 0.1;

/// A word with its box as fractions of page height (`top`, `height`) and
/// page width (`left`, `width`), origin at the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: Rectangle,
}

/// A word scaled to raster pixels, as persisted in the ground-truth word
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub text: String,
    pub top: i64,
    pub left: i64,
    pub height: i64,
    pub width: i64,
}

/// Locates the words of a single-page PDF.
#[derive(Debug, Clone)]
pub struct WordLocator {
    page: PageGlyphs,
}

impl WordLocator {
    /// Open a PDF from disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let doc = Document::load(path.as_ref())
            .map_err(|err| WarpsynthError::Pdf(format!("cannot load PDF: {err}")))?;
        Self::from_document(&doc)
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)
            .map_err(|err| WarpsynthError::Pdf(format!("cannot parse PDF: {err}")))?;
        Self::from_document(&doc)
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        Ok(Self {
            page: first_page_glyphs(doc)?,
        })
    }

    /// Page size in PDF units, as `(width, height)`.
    pub fn page_size(&self) -> (f64, f64) {
        (self.page.width, self.page.height)
    }

    /// All words of the page, in content order.
    ///
    /// Runs of whitespace produce no word. A word never spans two lines.
    pub fn words(&self) -> Vec<Word> {
        let (page_width, page_height) = self.page_size();
        let mut words = Vec::new();

        for line in split_lines(&self.page.glyphs) {
            for run in split_words(line) {
                let text: String = run.iter().map(|g| g.text.as_str()).collect();
                let boxes: Vec<Rectangle> = run.iter().map(|g| flip(g, page_height)).collect();
                if let Some(bbox) = Rectangle::union_all(&boxes) {
                    words.push(Word {
                        text,
                        bbox: bbox.scale(1.0 / page_width, 1.0 / page_height),
                    });
                }
            }
        }

        debug!(words = words.len(), "Words located");
        words
    }
}

/// Glyph box in top-left origin page coordinates.
fn flip(glyph: &Glyph, page_height: f64) -> Rectangle {
    Rectangle::from_corners(page_height - glyph.y1, glyph.x0, page_height - glyph.y0, glyph.x1)
}

fn vertical_overlap(a: &Glyph, b: &Glyph) -> f64 {
    if b.y0 <= a.y1 && a.y0 <= b.y1 {
        (a.y0 - b.y1).abs().min((a.y1 - b.y0).abs())
    } else {
        0.0
    }
}

fn horizontal_distance(a: &Glyph, b: &Glyph) -> f64 {
    if b.x0 <= a.x1 && a.x0 <= b.x1 {
        0.0
    } else {
        (a.x0 - b.x1).abs().min((a.x1 - b.x0).abs())
    }
}

/// Whether `next` continues the line of `previous`.
fn same_line(previous: &Glyph, next: &Glyph) -> bool {
    vertical_overlap(previous, next) > LINE_OVERLAP * previous.height().min(next.height())
        && horizontal_distance(previous, next) < CHAR_MARGIN * previous.width().max(next.width())
}

/// Split glyphs into horizontal lines by comparing consecutive glyphs.
fn split_lines(glyphs: &[Glyph]) -> Vec<&[Glyph]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for index in 1..glyphs.len() {
        if !same_line(&glyphs[index - 1], &glyphs[index]) {
            lines.push(&glyphs[start..index]);
            start = index;
        }
    }
    if start < glyphs.len() {
        lines.push(&glyphs[start..]);
    }
    lines
}

/// Split a line into words at whitespace glyphs and at wide gaps.
fn split_words(line: &[Glyph]) -> Vec<Vec<&Glyph>> {
    let mut words = Vec::new();
    let mut current: Vec<&Glyph> = Vec::new();
    let mut right_edge: Option<f64> = None;

    for glyph in line {
        let margin = WORD_MARGIN * glyph.width().max(glyph.height());
        let gap = right_edge.is_some_and(|x1| x1 < glyph.x0 - margin);
        right_edge = Some(glyph.x1);

        if gap && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        if glyph.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else {
            current.push(glyph);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Scale fractional words to a `height x width` raster and truncate to whole
/// pixels.
pub fn word_records(words: &[Word], height: u32, width: u32) -> Vec<WordRecord> {
    words
        .iter()
        .map(|word| {
            let scaled = word.bbox.scale(f64::from(width), f64::from(height));
            WordRecord {
                text: word.text.clone(),
                top: scaled.top as i64,
                left: scaled.left as i64,
                height: scaled.height as i64,
                width: scaled.width as i64,
            }
        })
        .collect()
}

/// Write word records as pretty-printed JSON.
#[instrument(skip(records), fields(path = %path.as_ref().display(), count = records.len()))]
pub fn write_word_records(path: impl AsRef<Path>, records: &[WordRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path.as_ref(), json)?;
    info!("Word records written");
    Ok(())
}

/// Read word records back from JSON.
pub fn read_word_records(path: impl AsRef<Path>) -> Result<Vec<WordRecord>> {
    let data = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Single-page document with a monospaced font (every width 600,
    /// descent -200) on a 600 x 800 page. `form` draws extra operations
    /// through a Form XObject named `/Fm1`.
    fn build_pdf(operations: Vec<Operation>, form: Option<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => "Mono",
            "Descent" => Object::Integer(-200),
            "Ascent" => Object::Integer(800),
        });
        let widths: Vec<Object> = (0..95).map(|_| Object::Integer(600)).collect();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Mono",
            "FirstChar" => Object::Integer(32),
            "LastChar" => Object::Integer(126),
            "Widths" => widths,
            "FontDescriptor" => descriptor_id,
        });
        let fonts = dictionary! { "F1" => font_id };

        let mut resources = dictionary! { "Font" => fonts.clone() };
        if let Some(form_ops) = form {
            let content = Content { operations: form_ops };
            let form_stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => media_box(),
                    "Matrix" => vec![
                        Object::Integer(1), Object::Integer(0), Object::Integer(0),
                        Object::Integer(1), Object::Integer(0), Object::Integer(-100),
                    ],
                    "Resources" => dictionary! { "Font" => fonts },
                },
                content.encode().expect("encode form"),
            );
            let form_id = doc.add_object(form_stream);
            resources.set("XObject", dictionary! { "Fm1" => form_id });
        }
        let resources_id = doc.add_object(resources);

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => Object::Integer(1),
                "Resources" => resources_id,
                "MediaBox" => media_box(),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");
        bytes
    }

    fn media_box() -> Vec<Object> {
        [0, 0, 600, 800].into_iter().map(Object::Integer).collect()
    }

    fn text_at(x: i64, y: i64, size: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(size)]),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    /// Twenty-point "INVOICE" at (100, 700): the box spans x 100..184 and
    /// y 696..716 in PDF space, i.e. top 84 from the page top.
    #[test]
    fn single_word_box() {
        let pdf = build_pdf(text_at(100, 700, 20, "INVOICE"), None);
        let locator = WordLocator::from_bytes(&pdf).expect("locator");
        assert_eq!(locator.page_size(), (600.0, 800.0));

        let words = locator.words();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "INVOICE");
        assert_close(words[0].bbox.top, 84.0 / 800.0);
        assert_close(words[0].bbox.left, 100.0 / 600.0);
        assert_close(words[0].bbox.height, 20.0 / 800.0);
        assert_close(words[0].bbox.width, 84.0 / 600.0);
    }

    #[test]
    fn spaces_split_words_and_lines_stay_apart() {
        let mut ops = text_at(50, 700, 10, "Total due");
        ops.extend(text_at(50, 600, 10, "EUR"));
        let pdf = build_pdf(ops, None);

        let words = WordLocator::from_bytes(&pdf).expect("locator").words();
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Total", "due", "EUR"]);
        // "due" starts after "Total " (six glyphs of 6 units).
        assert_close(words[1].bbox.left, 86.0 / 600.0);
        assert!(words[2].bbox.top > words[0].bbox.top);
    }

    #[test]
    fn tj_gap_splits_word() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(10)]),
            Operation::new("Td", vec![Object::Integer(50), Object::Integer(700)]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("AB"),
                    Object::Integer(-1000),
                    Object::string_literal("CD"),
                ])],
            ),
            Operation::new("ET", vec![]),
        ];
        let words = WordLocator::from_bytes(&build_pdf(ops, None)).expect("locator").words();
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["AB", "CD"]);
    }

    /// Text drawn through a Form XObject is located, shifted by the form
    /// matrix.
    #[test]
    fn form_xobject_text_is_found() {
        let ops = vec![Operation::new("Do", vec!["Fm1".into()])];
        let pdf = build_pdf(ops, Some(text_at(100, 700, 20, "PAID")));
        let words = WordLocator::from_bytes(&pdf).expect("locator").words();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "PAID");
        // 696 - 100 .. 716 - 100 in PDF space.
        assert_close(words[0].bbox.top, 184.0 / 800.0);
    }

    #[test]
    fn records_scale_and_truncate() {
        let words = vec![Word {
            text: "x".into(),
            bbox: Rectangle::new(0.105, 0.5, 0.025, 0.14),
        }];
        let records = word_records(&words, 1000, 300);
        assert_eq!(
            records[0],
            WordRecord {
                text: "x".into(),
                top: 105,
                left: 150,
                height: 25,
                width: 42,
            }
        );
    }

    #[test]
    fn records_roundtrip_through_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ground_truth_words.json");
        let records = vec![WordRecord {
            text: "IBAN".into(),
            top: 1,
            left: 2,
            height: 3,
            width: 4,
        }];
        write_word_records(&path, &records).expect("write");
        assert_eq!(read_word_records(&path).expect("read"), records);
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        let err = WordLocator::from_bytes(b"not a pdf").unwrap_err();
        assert!(matches!(err, WarpsynthError::Pdf(_)));
    }
}
