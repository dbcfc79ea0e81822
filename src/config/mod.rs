//! Build configuration for `pack.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── copy       # [[static_copies]]
//! │   ├── html       # [[html]]
//! │   ├── output     # [output], [minify]
//! │   ├── resolve    # [resolve]
//! │   └── rules      # [[rules]]
//! ├── error          # ConfigError, ConfigDiagnostics
//! └── mod.rs         # BundleConfig (this file)
//! ```
//!
//! The configuration is parsed once, normalized against the directory of the
//! config file and then passed by reference to every stage. Nothing in the
//! pipeline reads environment variables; the binary resolves the build mode
//! and hands it in through [`BundleConfig::with_mode`].

mod error;
pub mod section;
mod util;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use section::{HtmlPage, MinifyConfig, OutputConfig, ResolveConfig, RuleConfig, StaticCopy};
pub use util::find_config_file;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};
use crate::log;
use crate::utils::path::{normalize_path, resolve_path};

// ============================================================================
// enums
// ============================================================================

/// Build mode. Production minifies; only development rebuilds on change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Whether the minifier runs in this mode.
    pub const fn minify(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether `watch` may rebuild in this mode.
    pub const fn watch(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!(
                "unknown mode '{other}', expected 'development' or 'production'"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What counts as one logical package for duplicate detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateIdentity {
    /// Package name only; a package and its submodules are one identity.
    #[default]
    Package,
    /// Package name plus the path inside the package.
    Module,
}

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `pack.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory, parent of the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Build mode. May be left out and supplied by the caller.
    pub mode: Option<Mode>,

    /// Transform worker threads. Defaults to available parallelism.
    pub workers: Option<usize>,

    /// Fail the build when a package resolves to more than one version.
    pub strict_duplicates: bool,

    pub duplicate_identity: DuplicateIdentity,

    /// Chunk name → entry module.
    pub entries: BTreeMap<String, PathBuf>,

    pub rules: Vec<RuleConfig>,

    pub output: OutputConfig,

    pub minify: MinifyConfig,

    pub resolve: ResolveConfig,

    pub static_copies: Vec<StaticCopy>,

    pub html: Vec<HtmlPage>,
}

impl BundleConfig {
    /// Load and normalize configuration from a file.
    ///
    /// Unknown fields are reported as warnings. Validation is left to
    /// [`BundleConfig::validate`] so the caller can supply the mode first.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        let config_path = normalize_path(path);
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut config = config.with_root(&root);
        config.config_path = config_path;
        Ok(config)
    }

    /// Parse configuration from TOML string (paths are left as written).
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Set the project root and resolve every configured path against it.
    pub fn with_root(mut self, root: &Path) -> Self {
        let root = normalize_path(root);

        for entry in self.entries.values_mut() {
            *entry = resolve_path(entry, &root);
        }
        for rule in &mut self.rules {
            rule.normalize(&root);
        }
        self.output.normalize(&root);
        for copy in &mut self.static_copies {
            copy.normalize(&root);
        }
        for page in &mut self.html {
            page.normalize(&root);
        }

        self.root = root;
        self
    }

    /// Override the configured mode when a value is supplied.
    pub fn with_mode(mut self, mode: Option<Mode>) -> Self {
        if mode.is_some() {
            self.mode = mode;
        }
        self
    }

    /// The build mode, required before any graph resolution.
    pub fn mode(&self) -> BuildResult<Mode> {
        self.mode.ok_or_else(|| {
            BuildError::Configuration(
                "build mode is not set (use `mode` in pack.toml, --mode or NODE_ENV)".into(),
            )
        })
    }

    /// Worker threads for module transforms.
    pub fn workers(&self) -> usize {
        self.workers.filter(|&n| n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output.manifest_path()
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Collect every configuration problem, then fail once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.entries.is_empty() {
            diag.error_with_hint(
                "entries",
                "at least one entry is required",
                "[entries]\nmain = \"src/index.js\"",
            );
        }
        for (name, path) in &self.entries {
            let field = format!("entries.{name}");
            if name.is_empty() || name.contains(['/', '\\']) {
                diag.error(&field, "chunk names must be plain file names");
            }
            if !path.is_file() {
                diag.error(&field, format!("entry '{}' not found", path.display()));
            }
        }

        if self.workers == Some(0) {
            diag.error("workers", "must be at least 1");
        }

        RuleConfig::validate(&self.rules, &mut diag);
        self.output.validate(self.mode, &mut diag);
        StaticCopy::validate(&self.static_copies, &mut diag);
        HtmlPage::validate(&self.html, &self.entries, &mut diag);

        diag.into_result()
    }
}

// ============================================================================
// tests
// ============================================================================
