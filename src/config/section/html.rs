//! `[[html]]` pages.
//!
//! A template page that gets `<link>`/`<script>` tags for the listed
//! chunks injected after the chunks are emitted.
//!
//! ```toml
//! [[html]]
//! template = "src/html.html"
//! output = "index.html"
//! chunks = ["javascript"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::utils::path::resolve_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlPage {
    /// Template file (relative to project root).
    pub template: PathBuf,
    /// Output filename (relative to output dir). Not hashed.
    pub output: String,
    /// Chunks whose assets are injected, in this order.
    #[serde(default)]
    pub chunks: Vec<String>,
}

impl HtmlPage {
    pub fn normalize(&mut self, root: &Path) {
        self.template = resolve_path(&self.template, root);
    }

    pub fn validate(pages: &[Self], entries: &BTreeMap<String, PathBuf>, diag: &mut ConfigDiagnostics) {
        for (idx, page) in pages.iter().enumerate() {
            let field = format!("html[{idx}]");
            if !page.template.is_file() {
                diag.error(
                    &field,
                    format!("template '{}' is not a file", page.template.display()),
                );
            }
            if page.output.is_empty() || page.output.contains("..") || page.output.starts_with('/') {
                diag.error(&field, format!("invalid output name '{}'", page.output));
            }
            for chunk in &page.chunks {
                if !entries.contains_key(chunk) {
                    diag.error_with_hint(
                        format!("{field}.chunks"),
                        format!("unknown chunk '{chunk}'"),
                        "chunks are the keys of [entries]",
                    );
                }
            }
        }
    }
}
