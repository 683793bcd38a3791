// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ground-truth manifest — SHA-256 fingerprints of the files written for a
// sample, so re-runs can be checked for bit-identical output.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};
use warpsynth_core::error::{Result, WarpsynthError};

/// Compute the SHA-256 hash of `data` as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// File name → hex digest, for files inside one sample directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: BTreeMap<String, String>,
}

impl Manifest {
    /// Hash the named files of `dir`.
    #[instrument(skip(names), fields(dir = %dir.display(), count = names.len()))]
    pub fn build(dir: &Path, names: &[&str]) -> Result<Self> {
        let mut files = BTreeMap::new();
        for name in names {
            let data = std::fs::read(dir.join(name))?;
            files.insert((*name).to_string(), hash_bytes(&data));
        }
        Ok(Self { files })
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path.as_ref())?)?)
    }

    /// Re-hash every listed file of `dir` and compare with the recorded
    /// digest. Fails on the first mismatch.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn verify(&self, dir: &Path) -> Result<()> {
        for (name, expected) in &self.files {
            let actual = hash_bytes(&std::fs::read(dir.join(name))?);
            if &actual != expected {
                return Err(WarpsynthError::IntegrityMismatch {
                    file: name.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        info!(files = self.files.len(), "Manifest verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    #[test]
    fn hash_known_value() {
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(hash_bytes(b"hello"), expected);
    }

    #[test]
    fn verify_detects_changed_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("warped_BM.npz"), b"first").expect("write");

        let manifest = Manifest::build(dir.path(), &["warped_BM.npz"]).expect("build");
        manifest.verify(dir.path()).expect("unchanged");

        let path = dir.path().join("manifest.json");
        manifest.write(&path).expect("write manifest");
        assert_eq!(Manifest::load(&path).expect("load"), manifest);

        std::fs::write(dir.path().join("warped_BM.npz"), b"second").expect("rewrite");
        match manifest.verify(dir.path()) {
            Err(WarpsynthError::IntegrityMismatch { file, actual, .. }) => {
                assert_eq!(file, "warped_BM.npz");
                assert_eq!(actual, hash_bytes(b"second"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
