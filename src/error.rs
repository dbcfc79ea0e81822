//! Build error taxonomy.
//!
//! Every variant except `DuplicateModules` is fatal as soon as it is
//! detected; the generation aborts without publishing anything. The first
//! error encountered is the one returned.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;
use crate::duplicate::DuplicateRecord;
use crate::utils::plural::plural_s;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    /// Missing or invalid configuration. Raised before graph resolution.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no rule matches `{}`", .0.display())]
    NoMatchingRule(PathBuf),

    #[error("cannot resolve `{specifier}` imported from `{}`", .importer.display())]
    UnresolvedImport { importer: PathBuf, specifier: String },

    #[error("failed to read `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("transform failed for `{}` at stage `{stage}`: {cause}", .path.display())]
    Transform {
        path: PathBuf,
        stage: String,
        cause: String,
    },

    #[error("cyclic style import: {}", format_chain(.chain))]
    CyclicStyleImport { chain: Vec<PathBuf> },

    /// Output or manifest could not be written. The previously published
    /// manifest is left untouched.
    #[error("failed to write `{}`: {reason}", .path.display())]
    ManifestWrite { path: PathBuf, reason: String },

    /// Only raised when `strict_duplicates` is enabled.
    #[error("{} package{} resolved to more than one version", .0.len(), plural_s(.0.len()))]
    DuplicateModules(Vec<DuplicateRecord>),
}

impl BuildError {
    pub fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, reason: impl ToString) -> Self {
        Self::ManifestWrite {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl From<ConfigError> for BuildError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" → ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_lists_chain() {
        let err = BuildError::CyclicStyleImport {
            chain: vec!["a.scss".into(), "b.scss".into(), "a.scss".into()],
        };
        assert_eq!(
            err.to_string(),
            "cyclic style import: a.scss → b.scss → a.scss"
        );
    }

    #[test]
    fn test_transform_display_has_stage_and_path() {
        let err = BuildError::Transform {
            path: "src/data.json".into(),
            stage: "json".into(),
            cause: "expected value at line 1 column 1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("src/data.json"));
        assert!(msg.contains("`json`"));
        assert!(msg.contains("expected value"));
    }
}
