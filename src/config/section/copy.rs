//! `[[static_copies]]` configuration.
//!
//! Files and directories copied verbatim into the output directory, no
//! transform chain involved.
//!
//! # Example
//!
//! ```toml
//! static_copies = [
//!     "static",                                 # static/ → dist/static/
//!     { from = "fonts/inter.woff2", to = "fonts/inter.woff2" },
//!     { from = "public", as = "" },             # public/* → dist/*
//! ]
//! ```

use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::utils::path::resolve_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaticCopy {
    /// Source path; destination is its basename.
    Simple(PathBuf),
    /// Source path with an explicit destination (relative to output dir).
    Full {
        from: PathBuf,
        #[serde(alias = "as")]
        to: Option<PathBuf>,
    },
}

impl StaticCopy {
    /// Source file or directory.
    pub fn source(&self) -> &Path {
        match self {
            Self::Simple(p) => p,
            Self::Full { from, .. } => from,
        }
    }

    /// Destination relative to the output directory.
    ///
    /// An empty destination copies a directory's contents into the output root.
    pub fn destination(&self) -> PathBuf {
        let basename = |p: &Path| p.file_name().map(PathBuf::from).unwrap_or_default();
        match self {
            Self::Simple(p) => basename(p),
            Self::Full { from, to } => to.clone().unwrap_or_else(|| basename(from)),
        }
    }

    pub fn normalize(&mut self, root: &Path) {
        match self {
            Self::Simple(p) => *p = resolve_path(p, root),
            Self::Full { from, .. } => *from = resolve_path(from, root),
        }
    }

    /// Validate normalized copies: safe, unique destinations and existing sources.
    pub fn validate(copies: &[Self], diag: &mut ConfigDiagnostics) {
        let mut seen: FxHashMap<PathBuf, usize> = FxHashMap::default();

        for (idx, copy) in copies.iter().enumerate() {
            let field = format!("static_copies[{idx}]");
            let dest = copy.destination();

            let unsafe_component = dest.components().find_map(|comp| match comp {
                Component::ParentDir => Some("parent directory '..' not allowed"),
                Component::Prefix(_) | Component::RootDir => Some("absolute paths not allowed"),
                _ => None,
            });
            if let Some(reason) = unsafe_component {
                diag.error(&field, format!("destination '{}': {reason}", dest.display()));
            }

            if !copy.source().exists() {
                diag.error(
                    &field,
                    format!("source '{}' does not exist", copy.source().display()),
                );
            }

            if let Some(prev) = seen.insert(dest.clone(), idx) {
                diag.error(
                    &field,
                    format!(
                        "destination '{}' already used by static_copies[{prev}]",
                        dest.display()
                    ),
                );
            }
        }
    }
}
