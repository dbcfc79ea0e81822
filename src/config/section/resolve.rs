//! `[resolve]` section: how import specifiers map to files.
//!
//! Replaces process-wide module path variables with explicit values.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Extensions tried, in order, for script imports without one.
    pub extensions: Vec<String>,

    /// Module directories for bare specifiers, in order. A plain name
    /// (`node_modules`) is looked up in every ancestor of the importing
    /// file; a path (`./lib`) is resolved against the project root.
    pub modules: Vec<PathBuf>,

    /// Specifier aliases. A trailing `$` on the key means exact match only.
    pub alias: BTreeMap<String, String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: [".ts", ".tsx", ".js", ".json", ".jsx"]
                .into_iter()
                .map(String::from)
                .collect(),
            modules: vec![PathBuf::from("node_modules")],
            alias: BTreeMap::new(),
        }
    }
}
