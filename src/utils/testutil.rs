//! Shared test fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{BundleConfig, Mode, RuleConfig};
use crate::graph::{EntryGraph, ModuleGraph, Resolver};
use crate::rule::RuleDispatcher;
use crate::transform::{TransformCache, Transformer};
use crate::utils::path::normalize_path;

/// Write `content` to `root/rel`, creating parents. Returns the normalized path.
pub fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    normalize_path(&path)
}

/// Scripts, sass and plain css, the usual set.
pub fn rules() -> Vec<RuleConfig> {
    let rule = |pattern: &str, chain: Vec<Transformer>| RuleConfig {
        pattern: pattern.to_string(),
        include: Vec::new(),
        exclude: Vec::new(),
        chain,
    };
    vec![
        rule(r"\.(tsx?|jsx?)$", vec![Transformer::Script]),
        rule(r"\.s[ac]ss$", vec![Transformer::Sass, Transformer::TagStyle]),
        rule(r"\.css$", vec![Transformer::Css, Transformer::TagStyle]),
        rule(r"\.json$", vec![Transformer::Json]),
    ]
}

/// Development config rooted at `root` with the given entries.
pub fn config(root: &Path, entries: &[(&str, &str)]) -> BundleConfig {
    BundleConfig {
        mode: Some(Mode::Development),
        workers: Some(2),
        entries: entries
            .iter()
            .map(|(name, rel)| (name.to_string(), PathBuf::from(rel)))
            .collect(),
        rules: rules(),
        ..BundleConfig::default()
    }
    .with_root(root)
}

/// Resolve the graph for `entries` with the default fixture config.
pub fn graph_for(root: &Path, entries: &[(&str, &str)]) -> ModuleGraph {
    let config = config(root, entries);
    let rules = RuleDispatcher::from_config(&config.rules, &config.root).unwrap();
    let resolver = Resolver::new(&config.resolve, &config.root);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
    let cache = TransformCache::new();
    EntryGraph {
        rules: &rules,
        resolver: &resolver,
        cache: &cache,
        pool: &pool,
        progress: None,
    }
    .resolve(&config.entries)
    .unwrap()
}
