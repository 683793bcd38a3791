// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — glyph extraction from page content streams and word location.

pub mod glyphs;
pub mod words;

pub use words::{Word, WordLocator, WordRecord, read_word_records, word_records, write_word_records};
