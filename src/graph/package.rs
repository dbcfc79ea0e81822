//! Package identity for modules living in module directories.

use std::fs;
use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::utils::path::relative_slash;

/// Version reported when a package has no readable `package.json` version.
pub const UNKNOWN_VERSION: &str = "unknown";

/// The fields of `package.json` the bundler reads.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    pub main: Option<String>,
    pub style: Option<String>,
    pub sass: Option<String>,
}

impl PackageJson {
    /// Read `<dir>/package.json`. Missing or malformed files yield `None`.
    pub fn read(dir: &Path) -> Option<Self> {
        let content = fs::read(dir.join("package.json")).ok()?;
        serde_json::from_slice(&content).ok()
    }
}

/// Which installed package a module belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    /// `name` or `@scope/name`.
    pub name: String,
    pub version: String,
    /// Package directory (`.../node_modules/<name>`).
    pub root: PathBuf,
    /// Module path inside the package, `/`-separated.
    pub subpath: String,
}

/// Locates packages and remembers their versions.
#[derive(Debug, Default)]
pub struct PackageIndex {
    versions: FxHashMap<PathBuf, String>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The package containing `path`, taken from the innermost
    /// `node_modules/<name>` (or `node_modules/@scope/name`) segment.
    pub fn lookup(&mut self, path: &Path) -> Option<PackageRef> {
        let (name, root) = package_root(path)?;
        let version = self
            .versions
            .entry(root.clone())
            .or_insert_with(|| {
                PackageJson::read(&root)
                    .and_then(|pkg| pkg.version)
                    .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
            })
            .clone();
        let subpath = relative_slash(path, &root);
        Some(PackageRef {
            name,
            version,
            root,
            subpath,
        })
    }
}

fn package_root(path: &Path) -> Option<(String, PathBuf)> {
    let components: Vec<Component<'_>> = path.components().collect();
    let marker = components
        .iter()
        .rposition(|c| c.as_os_str() == "node_modules")?;

    let first = components.get(marker + 1)?.as_os_str().to_str()?;
    let (name, len) = if first.starts_with('@') {
        let second = components.get(marker + 2)?.as_os_str().to_str()?;
        (format!("{first}/{second}"), 2)
    } else {
        (first.to_string(), 1)
    };

    // The package dir itself is not a module inside the package.
    if components.len() <= marker + 1 + len {
        return None;
    }
    let root: PathBuf = components[..=marker + len].iter().collect();
    Some((name, root))
}
