use std::path::{Path, PathBuf};

use super::{Content, StageContext, TransformOutput, Transformer, validate_chain};
use crate::error::{BuildError, BuildResult};
use crate::hash::{ContentHash, KeyHasher};
use crate::utils::path::to_slash;

/// A validated, ordered list of stages chosen by one rule.
#[derive(Debug, Clone)]
pub struct TransformChain {
    stages: Vec<Transformer>,
    style: bool,
    base: PathBuf,
    config_hash: ContentHash,
}

impl TransformChain {
    /// Build a chain, rejecting incompatible stage sequences.
    ///
    /// `base` is the directory auxiliary file names are relative to.
    pub fn new(stages: Vec<Transformer>, base: PathBuf) -> Result<Self, String> {
        validate_chain(&stages)?;
        let style = stages.iter().any(|s| matches!(s, Transformer::TagStyle));
        let config_hash = Self::hash_config(&stages, &base);
        Ok(Self {
            stages,
            style,
            base,
            config_hash,
        })
    }

    fn hash_config(stages: &[Transformer], base: &Path) -> ContentHash {
        let mut hasher = KeyHasher::new();
        hasher.field(to_slash(base).as_bytes());
        for stage in stages {
            hasher.field(stage.name());
            if let Transformer::Define(defs) = stage {
                for (key, value) in defs {
                    hasher.field(key).field(value);
                }
            }
        }
        hasher.finish()
    }

    pub fn stages(&self) -> &[Transformer] {
        &self.stages
    }

    /// Whether modules under this chain go into the style bundle.
    pub const fn is_style(&self) -> bool {
        self.style
    }

    /// Hash of the chain's effective configuration.
    pub const fn config_hash(&self) -> ContentHash {
        self.config_hash
    }

    /// Run every stage over `input`, stopping at the first failure.
    pub fn apply(&self, path: &Path, input: &[u8]) -> BuildResult<TransformOutput> {
        let ctx = StageContext {
            path,
            base: &self.base,
        };

        let mut content = Content::Bytes(input.to_vec());
        for stage in &self.stages {
            content = stage
                .apply(content, &ctx)
                .map_err(|cause| BuildError::Transform {
                    path: path.to_path_buf(),
                    stage: stage.name().to_string(),
                    cause,
                })?;
        }

        Ok(match content {
            Content::Bytes(code) => TransformOutput {
                code,
                imports: Vec::new(),
                emitted: None,
            },
            Content::Tree(tree) => TransformOutput {
                code: tree.text.into_bytes(),
                imports: tree.imports,
                emitted: None,
            },
            Content::Final { code, emitted } => TransformOutput {
                code,
                imports: Vec::new(),
                emitted,
            },
        })
    }
}
