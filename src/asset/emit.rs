//! Content-addressed asset emission.
//!
//! Every output file of a generation passes through one [`AssetEmitter`],
//! which owns the claim table: an output name maps to exactly one content
//! hash per build. Hashed names are collision-free by construction; a
//! fixed name (static copy, HTML page, `file` output) claimed twice with
//! different bytes is a build error.
//!
//! Changed outputs are staged as temp files beside their destination and
//! only moved into place by [`AssetEmitter::commit`], right before the
//! manifest is published. A generation that fails earlier drops the
//! emitter, which removes the temp files and leaves every published output
//! as it was.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;

use crate::debug;
use crate::error::{BuildError, BuildResult};
use crate::hash::ContentHash;
use crate::utils::write::{content_matches, stage};

/// A changed output waiting for [`AssetEmitter::commit`].
struct PendingWrite {
    temp: NamedTempFile,
    path: PathBuf,
    rel: String,
}

pub struct AssetEmitter {
    out_dir: PathBuf,
    hash_length: usize,
    claims: FxHashMap<String, ContentHash>,
    pending: Vec<PendingWrite>,
    written: usize,
}

impl AssetEmitter {
    pub fn new(out_dir: &Path, hash_length: usize) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            hash_length,
            claims: FxHashMap::default(),
            pending: Vec::new(),
            written: 0,
        }
    }

    /// Hash `bytes`, expand `template` and stage the file.
    ///
    /// Returns the output name relative to the output directory.
    pub fn emit_hashed(
        &mut self,
        template: &str,
        name: &str,
        ext: &str,
        bytes: &[u8],
    ) -> BuildResult<String> {
        let hash = ContentHash::of(bytes);
        let filename = expand_template(template, name, &hash.digest(self.hash_length), ext);
        self.emit(filename, hash, bytes)
    }

    /// Stage `bytes` under a fixed name relative to the output directory.
    pub fn emit_fixed(&mut self, rel: &str, bytes: &[u8]) -> BuildResult<String> {
        self.emit(rel.to_string(), ContentHash::of(bytes), bytes)
    }

    fn emit(&mut self, rel: String, hash: ContentHash, bytes: &[u8]) -> BuildResult<String> {
        let path = self.out_dir.join(&rel);
        match self.claims.get(&rel) {
            Some(prev) if *prev == hash => return Ok(rel),
            Some(_) => {
                return Err(BuildError::write(
                    &path,
                    "name already claimed by different content in this build",
                ));
            }
            None => {}
        }

        if !content_matches(&path, bytes) {
            let temp = stage(&path, bytes).map_err(|e| BuildError::write(&path, e))?;
            self.pending.push(PendingWrite {
                temp,
                path,
                rel: rel.clone(),
            });
        }
        self.claims.insert(rel.clone(), hash);
        Ok(rel)
    }

    /// Move every staged output into place.
    pub fn commit(&mut self) -> BuildResult<()> {
        for PendingWrite { temp, path, rel } in self.pending.drain(..) {
            temp.persist(&path)
                .map_err(|e| BuildError::write(&path, e.error))?;
            debug!("emit"; "wrote {}", rel);
            self.written += 1;
        }
        Ok(())
    }

    /// Outputs staged but not yet committed.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Files committed so far (content differed from disk).
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

/// Substitute `{name}`, `{hash}` and `{ext}` in a filename template.
pub fn expand_template(template: &str, name: &str, hash: &str, ext: &str) -> String {
    template
        .replace("{name}", name)
        .replace("{hash}", hash)
        .replace("{ext}", ext)
}
