//! Cross-generation transform memo.
//!
//! Keyed by module path, input hash and chain hash, so a cached output is
//! only reused when both the bytes and the effective chain configuration are
//! unchanged. Entries not touched by the latest generation are pruned.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use rustc_hash::FxHashSet;

use super::{EmittedFile, Import};
use crate::error::BuildResult;
use crate::hash::ContentHash;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub input: ContentHash,
    pub chain: ContentHash,
}

/// Final result of running a chain over one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Bytes that go into the chunk bundle.
    pub code: Vec<u8>,
    /// Import edges in source order.
    pub imports: Vec<Import>,
    /// Auxiliary file produced by a `file` stage.
    pub emitted: Option<EmittedFile>,
}

/// Thread-safe transform cache shared by all generations of a bundler.
#[derive(Default)]
pub struct TransformCache {
    entries: DashMap<CacheKey, Arc<TransformOutput>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached output for `key` or compute and store it.
    ///
    /// The flag is `true` on a cache hit. Failures are not cached.
    pub fn get_or_transform(
        &self,
        key: &CacheKey,
        transform: impl FnOnce() -> BuildResult<TransformOutput>,
    ) -> BuildResult<(Arc<TransformOutput>, bool)> {
        if let Some(cached) = self.entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((Arc::clone(&cached), true));
        }

        let output = Arc::new(transform()?);
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(key.clone(), Arc::clone(&output));
        Ok((output, false))
    }

    /// Drop every entry whose key is not in `live`.
    pub fn prune(&self, live: &FxHashSet<CacheKey>) {
        self.entries.retain(|key, _| live.contains(key));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}
