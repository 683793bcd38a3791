// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Warpsynth.

use thiserror::Error;

/// Top-level error type for all Warpsynth operations.
#[derive(Debug, Error)]
pub enum WarpsynthError {
    // -- Input errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("array archive error: {0}")]
    Archive(String),

    #[error("invalid array shape: expected {expected}, got {actual}")]
    InvalidShape { expected: String, actual: String },

    // -- Algorithm errors --
    #[error("interpolation failed: {0}")]
    Interpolation(String),

    #[error("layout extraction failed: {0}")]
    Layout(String),

    #[error("integrity check failed for {file}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WarpsynthError>;
