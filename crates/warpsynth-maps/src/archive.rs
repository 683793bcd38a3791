// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-array `.npz` archives — every raster and map of a sample is stored
// as a compressed archive holding exactly one array named after the file
// stem.

use std::fs::File;
use std::path::Path;

use ndarray::{Array, ArrayBase, Data, Dimension, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter, WritableElement};
use tracing::{debug, instrument};
use warpsynth_core::error::{Result, WarpsynthError};

fn archive_error(path: &Path, err: impl std::fmt::Display) -> WarpsynthError {
    WarpsynthError::Archive(format!("{}: {err}", path.display()))
}

/// Open an archive and return its reader plus the name of its only entry.
fn open_single(path: &Path) -> Result<(NpzReader<File>, String)> {
    let file = File::open(path)?;
    let mut reader = NpzReader::new(file).map_err(|err| archive_error(path, err))?;
    let names = reader.names().map_err(|err| archive_error(path, err))?;
    match names.as_slice() {
        [name] => Ok((reader, name.clone())),
        _ => Err(archive_error(
            path,
            format!("holds {} arrays, expected exactly one", names.len()),
        )),
    }
}

/// Read a floating-point array stored as `f32` or `f64`, widened to `f64`.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_float<D: Dimension>(path: impl AsRef<Path>) -> Result<Array<f64, D>> {
    let path = path.as_ref();
    let (mut reader, name) = open_single(path)?;
    let array = match reader.by_name::<OwnedRepr<f32>, D>(&name) {
        Ok(array) => array.mapv(f64::from),
        Err(_) => reader
            .by_name::<OwnedRepr<f64>, D>(&name)
            .map_err(|err| archive_error(path, err))?,
    };
    debug!(shape = ?array.shape(), "Array loaded");
    Ok(array)
}

/// Read a boolean array.
pub fn read_bool<D: Dimension>(path: impl AsRef<Path>) -> Result<Array<bool, D>> {
    let path = path.as_ref();
    let (mut reader, name) = open_single(path)?;
    reader
        .by_name::<OwnedRepr<bool>, D>(&name)
        .map_err(|err| archive_error(path, err))
}

/// Write `array` as the only entry of a compressed archive, named after the
/// file stem (`warped_BM.npz` holds `warped_BM`).
#[instrument(skip(array), fields(path = %path.as_ref().display(), shape = ?array.shape()))]
pub fn write_array<S, D>(path: impl AsRef<Path>, array: &ArrayBase<S, D>) -> Result<()>
where
    S: Data,
    S::Elem: WritableElement,
    D: Dimension,
{
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| archive_error(path, "file name has no usable stem"))?;

    let file = File::create(path)?;
    let mut writer = NpzWriter::new_compressed(file);
    writer
        .add_array(format!("{stem}.npy"), array)
        .map_err(|err| archive_error(path, err))?;
    writer.finish().map_err(|err| archive_error(path, err))?;
    debug!("Array written");
    Ok(())
}

/// Check the trailing dimensions of a loaded array.
pub fn expect_shape(actual: &[usize], expected: &[Option<usize>], what: &str) -> Result<()> {
    let matches = actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, e)| e.is_none_or(|e| e == *a) && *a > 0);
    if matches {
        return Ok(());
    }
    let pattern: Vec<String> = expected
        .iter()
        .map(|e| e.map_or_else(|| "N".to_string(), |e| e.to_string()))
        .collect();
    Err(WarpsynthError::InvalidShape {
        expected: format!("{what} of shape ({})", pattern.join(", ")),
        actual: format!("{actual:?}"),
    })
}
