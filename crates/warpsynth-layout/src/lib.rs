// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// warpsynth-layout — Layout ground truth for the Warpsynth pipeline.
//
// Provides rectangle algebra, extraction of named field boxes from
// colour-tagged template renderings, PDF word location, the tag palette and
// overlay drawing for inspection.

pub mod fields;
pub mod palette;
pub mod pdf;
pub mod rect;
pub mod visualize;

// Re-export the primary entry points so callers can use `warpsynth_layout::Rectangle` etc.
pub use fields::{FieldRecord, expand_children, extract_template_fields, field_records, find_bounding_boxes};
pub use palette::color_range;
pub use pdf::{Word, WordLocator, WordRecord, word_records};
pub use rect::Rectangle;
