//! `[output]` and `[minify]` sections.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, Mode};
use crate::utils::path::resolve_path;

/// Default filename template (`[name].bundle.[contenthash].js` style).
pub const DEFAULT_TEMPLATE: &str = "{name}.bundle.{hash}.{ext}";

/// Default digest width in hex chars.
pub const DEFAULT_HASH_LENGTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory.
    pub dir: PathBuf,

    /// Filename template for script sub-bundles.
    pub script: String,

    /// Filename template for style sub-bundles.
    pub style: String,

    /// Digest width in hex chars (8..=64).
    pub hash_length: usize,

    /// Published manifest location. Defaults to `<dir>/manifest.json`.
    pub manifest: Option<PathBuf>,

    /// Remove files not referenced by the new manifest after publishing.
    pub clean: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dist"),
            script: DEFAULT_TEMPLATE.to_string(),
            style: DEFAULT_TEMPLATE.to_string(),
            hash_length: DEFAULT_HASH_LENGTH,
            manifest: None,
            clean: false,
        }
    }
}

impl OutputConfig {
    pub fn normalize(&mut self, root: &Path) {
        self.dir = resolve_path(&self.dir, root);
        self.manifest = Some(match &self.manifest {
            Some(path) => resolve_path(path, root),
            None => self.dir.join("manifest.json"),
        });
    }

    /// Published manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.dir.join("manifest.json"))
    }

    pub fn validate(&self, mode: Option<Mode>, diag: &mut ConfigDiagnostics) {
        if !(8..=64).contains(&self.hash_length) {
            diag.error(
                "output.hash_length",
                format!("{} is out of range 8..=64", self.hash_length),
            );
        }

        for (field, template) in [("output.script", &self.script), ("output.style", &self.style)] {
            if !template.contains("{name}") {
                diag.error_with_hint(
                    field,
                    format!("template '{template}' has no {{name}} placeholder"),
                    "chunks would overwrite each other",
                );
            }
            if template.contains('/') || template.contains('\\') {
                diag.error(field, format!("template '{template}' must be a plain filename"));
            }
            if mode == Some(Mode::Production) && !template.contains("{hash}") {
                diag.error_with_hint(
                    field,
                    format!("template '{template}' has no {{hash}} placeholder"),
                    "production outputs must be content-addressed",
                );
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinifyConfig {
    /// Keep identifier names intact (no mangling). Needed when other code
    /// refers to functions or classes by their literal name.
    pub keep_names: bool,
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self { keep_names: true }
    }
}
