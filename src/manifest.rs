//! Manifest publication.
//!
//! The manifest maps logical asset names to output names relative to the
//! output directory, serialized as pretty JSON with sorted keys. Publishing
//! is write-then-rename: the new manifest is staged in a temp file next to
//! the published one and only renamed over it on [`StagedManifest::commit`].
//! Dropping a staged manifest removes the temp file and leaves the
//! previously published manifest untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{BuildError, BuildResult};
use crate::utils::write::stage;

/// Logical name → output name.
pub type Manifest = BTreeMap<String, String>;

#[derive(Debug)]
pub struct ManifestWriter {
    path: PathBuf,
    entries: Manifest,
}

impl ManifestWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: Manifest::new(),
        }
    }

    /// Add an entry. A key already mapped to a different value is an error.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> BuildResult<()> {
        let key = key.into();
        let value = value.into();
        match self.entries.get(&key) {
            Some(existing) if *existing == value => Ok(()),
            Some(existing) => Err(BuildError::write(
                &self.path,
                format!("duplicate manifest key `{key}` (`{existing}` and `{value}`)"),
            )),
            None => {
                self.entries.insert(key, value);
                Ok(())
            }
        }
    }

    pub fn entries(&self) -> &Manifest {
        &self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialized manifest bytes.
    pub fn to_bytes(&self) -> BuildResult<Vec<u8>> {
        let mut bytes =
            serde_json::to_vec_pretty(&self.entries).map_err(|e| BuildError::write(&self.path, e))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write the manifest to a synced temp file beside the published path.
    pub fn stage(&self) -> BuildResult<StagedManifest> {
        let bytes = self.to_bytes()?;
        let temp = stage(&self.path, &bytes).map_err(|e| BuildError::write(&self.path, e))?;
        Ok(StagedManifest {
            temp,
            path: self.path.clone(),
        })
    }

    pub fn into_entries(self) -> Manifest {
        self.entries
    }
}

/// A fully written manifest waiting to replace the published one.
#[must_use = "a staged manifest is discarded unless committed"]
pub struct StagedManifest {
    temp: NamedTempFile,
    path: PathBuf,
}

impl StagedManifest {
    /// Atomically rename the staged file over the published path.
    pub fn commit(self) -> BuildResult<()> {
        self.temp
            .persist(&self.path)
            .map_err(|e| BuildError::write(&self.path, e.error))?;
        Ok(())
    }
}

/// Read a published manifest. Missing or unparsable files yield `None`.
pub fn read_manifest(path: &Path) -> Option<Manifest> {
    let content = fs::read(path).ok()?;
    serde_json::from_slice(&content).ok()
}
