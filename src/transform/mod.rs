//! Typed transform stages and the chains built from them.
//!
//! Every stage declares the representation it consumes and the one it
//! produces, so a chain can be checked before any module is read:
//!
//! | descriptor   | input → output |
//! |--------------|----------------|
//! | `script`     | bytes → tree   |
//! | `sass`       | bytes → tree   |
//! | `css`        | bytes → tree   |
//! | `tag-style`  | tree → tree    |
//! | `define`     | tree → tree    |
//! | `raw`        | bytes → final  |
//! | `svg-inline` | bytes → final  |
//! | `json`       | bytes → final  |
//! | `file`       | bytes → final  |
//!
//! A tree is module text plus the import edges found in it. Later stages
//! may rewrite the text; the edges are fixed once collected.

mod cache;
mod chain;
mod raw;
mod script;
mod style;
pub(crate) mod syntax;

pub use cache::{CacheKey, TransformCache, TransformOutput};
pub use chain::TransformChain;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ============================================================================
// Transformer descriptors
// ============================================================================

/// One stage of a transform chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transformer {
    /// Parse script text and collect its import specifiers.
    Script,
    /// Sass/SCSS: strip line comments, lift `@import`/`@use`/`@forward`.
    Sass,
    /// Plain CSS: lift `@import`.
    Css,
    /// Mark the chain as style-producing.
    TagStyle,
    /// Replace identifier and member-path references with literal source
    /// text. Needs script input.
    Define(BTreeMap<String, String>),
    /// Export the file text as a string.
    Raw,
    /// Export a cleaned-up SVG document as a string.
    SvgInline,
    /// Export parsed JSON.
    Json,
    /// Emit the file verbatim and export its public path.
    File,
}

/// Content representation between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repr {
    Bytes,
    Tree,
    Final,
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bytes => "bytes",
            Self::Tree => "tree",
            Self::Final => "final",
        })
    }
}

impl Transformer {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Sass => "sass",
            Self::Css => "css",
            Self::TagStyle => "tag-style",
            Self::Define(_) => "define",
            Self::Raw => "raw",
            Self::SvgInline => "svg-inline",
            Self::Json => "json",
            Self::File => "file",
        }
    }

    pub const fn input(&self) -> Repr {
        match self {
            Self::TagStyle | Self::Define(_) => Repr::Tree,
            _ => Repr::Bytes,
        }
    }

    pub const fn output(&self) -> Repr {
        match self {
            Self::Script | Self::Sass | Self::Css | Self::TagStyle | Self::Define(_) => Repr::Tree,
            Self::Raw | Self::SvgInline | Self::Json | Self::File => Repr::Final,
        }
    }

    /// Run this stage on `content`. The error is the stage's cause message.
    fn apply(&self, content: Content, ctx: &StageContext<'_>) -> Result<Content, String> {
        match (self, content) {
            (Self::Script, Content::Bytes(bytes)) => script::parse(&bytes).map(Content::Tree),
            (Self::Sass, Content::Bytes(bytes)) => style::parse_sass(&bytes).map(Content::Tree),
            (Self::Css, Content::Bytes(bytes)) => style::parse_css(&bytes).map(Content::Tree),
            (Self::TagStyle, tree @ Content::Tree(_)) => Ok(tree),
            (Self::Define(defs), Content::Tree(mut tree)) => {
                tree.text = script::define(&tree.text, defs)?;
                Ok(Content::Tree(tree))
            }
            (Self::Raw, Content::Bytes(bytes)) => raw::raw(&bytes),
            (Self::SvgInline, Content::Bytes(bytes)) => raw::svg_inline(&bytes),
            (Self::Json, Content::Bytes(bytes)) => raw::json(&bytes),
            (Self::File, Content::Bytes(bytes)) => raw::file(bytes, ctx),
            (stage, content) => Err(format!(
                "stage `{}` expects {} input, got {}",
                stage.name(),
                stage.input(),
                content.repr()
            )),
        }
    }
}

/// Check that a chain's stage representations line up.
///
/// The first stage must accept raw bytes, each following stage must accept
/// what the previous one produced, and `tag-style` may appear at most once.
pub fn validate_chain(chain: &[Transformer]) -> Result<(), String> {
    let mut current = Repr::Bytes;
    for (idx, stage) in chain.iter().enumerate() {
        if stage.input() != current {
            return Err(format!(
                "stage {idx} `{}` expects {} input but receives {current}",
                stage.name(),
                stage.input()
            ));
        }
        current = stage.output();
    }

    let tags = chain
        .iter()
        .filter(|s| matches!(s, Transformer::TagStyle))
        .count();
    if tags > 1 {
        return Err(format!("`tag-style` appears {tags} times, at most once allowed"));
    }
    Ok(())
}

// ============================================================================
// Content representations
// ============================================================================

/// What kind of edge an import creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImportKind {
    Script,
    Style,
}

/// One import reference found in a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Import {
    pub specifier: String,
    pub kind: ImportKind,
}

impl Import {
    pub fn script(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            kind: ImportKind::Script,
        }
    }

    pub fn style(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            kind: ImportKind::Style,
        }
    }
}

/// Intermediate representation: module text plus its import edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleTree {
    pub text: String,
    pub imports: Vec<Import>,
}

/// A file a stage wants written next to the bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    /// `/`-separated path relative to the output directory.
    pub path: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
enum Content {
    Bytes(Vec<u8>),
    Tree(ModuleTree),
    Final {
        code: Vec<u8>,
        emitted: Option<EmittedFile>,
    },
}

impl Content {
    const fn repr(&self) -> Repr {
        match self {
            Self::Bytes(_) => Repr::Bytes,
            Self::Tree(_) => Repr::Tree,
            Self::Final { .. } => Repr::Final,
        }
    }
}

/// Per-module inputs a stage may need besides the content.
struct StageContext<'a> {
    path: &'a Path,
    /// Directory auxiliary file names are relative to.
    base: &'a Path,
}
