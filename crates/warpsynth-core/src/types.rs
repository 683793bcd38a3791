// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Warpsynth ground-truth pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WarpsynthError};

/// Canonical fixed-width encoding of an RGB colour: `0x00RRGGBB`.
///
/// Ordering matches lexicographic ordering of the `(r, g, b)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorKey(pub u32);

impl ColorKey {
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self(u32::from(rgb[0]) << 16 | u32::from(rgb[1]) << 8 | u32::from(rgb[2]))
    }

    pub fn rgb(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0x00ff_ffff)
    }
}

impl FromStr for ColorKey {
    type Err = WarpsynthError;

    /// Parse `#rrggbb` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(WarpsynthError::Config(format!(
                "colour {s:?} is not of the form #rrggbb"
            )));
        }
        u32::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|err| WarpsynthError::Config(format!("colour {s:?}: {err}")))
    }
}

impl TryFrom<String> for ColorKey {
    type Error = WarpsynthError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ColorKey> for String {
    fn from(value: ColorKey) -> Self {
        value.to_string()
    }
}

/// Lookup table from tag colour to (optional) semantic name.
///
/// Only colours present in the table take part in box detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    entries: BTreeMap<ColorKey, Option<String>>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table of colours without names (used for containers).
    pub fn unnamed(colors: impl IntoIterator<Item = ColorKey>) -> Self {
        Self {
            entries: colors.into_iter().map(|color| (color, None)).collect(),
        }
    }

    pub fn insert(&mut self, color: ColorKey, name: Option<String>) {
        self.entries.insert(color, name);
    }

    pub fn contains(&self, color: ColorKey) -> bool {
        self.entries.contains_key(&color)
    }

    /// The name bound to `color`, if the colour is known and named.
    pub fn name(&self, color: ColorKey) -> Option<&str> {
        self.entries.get(&color).and_then(|name| name.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ColorKey, Option<String>)> for ColorTable {
    fn from_iter<T: IntoIterator<Item = (ColorKey, Option<String>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Colour assignment of a rendered template: every layout container colour
/// maps the colours of the fields it encloses to their field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub containers: BTreeMap<ColorKey, BTreeMap<ColorKey, String>>,
}

impl FieldLayout {
    /// Load a layout description from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Colours of all layout containers.
    pub fn container_table(&self) -> ColorTable {
        ColorTable::unnamed(self.containers.keys().copied())
    }

    /// Colours of all fields, bound to their names.
    pub fn field_table(&self) -> ColorTable {
        self.containers
            .values()
            .flat_map(|fields| fields.iter())
            .map(|(color, name)| (*color, Some(name.clone())))
            .collect()
    }

    /// `(field colour, container colour)` pairs that fold every field into
    /// the container enclosing it.
    pub fn reduction_pairs(&self) -> Vec<(ColorKey, ColorKey)> {
        self.containers
            .iter()
            .flat_map(|(container, fields)| fields.keys().map(move |field| (*field, *container)))
            .collect()
    }
}

/// File names of one sample directory.
pub mod files {
    pub const WARPED_UV: &str = "warped_UV.npz";
    pub const WARPED_WC: &str = "warped_WC.npz";
    pub const FLAT_TEXT_MASK: &str = "flat_text_mask.png";
    pub const FLAT_DOCUMENT_PNG: &str = "flat_document.png";
    pub const FLAT_DOCUMENT_PDF: &str = "flat_document.pdf";
    pub const FLAT_TEMPLATE_STRUCTURE: &str = "flat_template_structure.png";

    pub const WARPED_BM: &str = "warped_BM.npz";
    pub const WARPED_ANGLE: &str = "warped_angle.npz";
    pub const WARPED_CURVATURE: &str = "warped_curvature.npz";
    pub const WARPED_TEXT_MASK: &str = "warped_text_mask.npz";

    pub const GROUND_TRUTH_TAGS: &str = "ground_truth_tags.json";
    pub const GROUND_TRUTH_WORDS: &str = "ground_truth_words.json";
    pub const GROUND_TRUTH_MANIFEST: &str = "ground_truth_manifest.json";
}
