//! Script stages: import collection and compile-time definitions.

use std::collections::BTreeMap;

use super::syntax::{self, analyze};
use super::{Import, ModuleTree};

/// Decode script text and collect import specifiers in source order.
///
/// Each specifier is listed once, at its first occurrence. The text itself
/// is kept unchanged; a syntax error fails the stage.
pub fn parse(bytes: &[u8]) -> Result<ModuleTree, String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| format!("source is not valid UTF-8: {e}"))?
        .to_string();

    let imports = analyze(&text)?
        .specifiers()
        .into_iter()
        .map(Import::script)
        .collect();

    Ok(ModuleTree { text, imports })
}

/// Replace each defined identifier or member path with its literal text.
pub fn define(text: &str, defs: &BTreeMap<String, String>) -> Result<String, String> {
    syntax::define(text, defs)
}
