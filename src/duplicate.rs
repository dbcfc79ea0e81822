//! Duplicate package detection.
//!
//! Runs on the completed graph. A logical package reached at more than one
//! version yields a [`DuplicateRecord`]; records are warnings unless the
//! build is strict.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use crate::config::DuplicateIdentity;
use crate::graph::{ModuleGraph, PackageRef};
use crate::log;
use crate::utils::plural::plural_count;

/// One logical package found at several versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecord {
    /// Package name, or `name/subpath` under module identity.
    pub package: String,
    /// Version → modules importing that version from outside the package.
    pub versions: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl fmt::Display for DuplicateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let versions: Vec<&str> = self.versions.keys().map(String::as_str).collect();
        write!(f, "{} ({})", self.package, versions.join(", "))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    identity: DuplicateIdentity,
}

impl DuplicateDetector {
    pub fn new(identity: DuplicateIdentity) -> Self {
        Self { identity }
    }

    fn identity_of(&self, pkg: &PackageRef) -> String {
        match self.identity {
            DuplicateIdentity::Package => pkg.name.clone(),
            DuplicateIdentity::Module => format!("{}/{}", pkg.name, pkg.subpath),
        }
    }

    /// Records for every identity with more than one version, sorted by name.
    pub fn detect(&self, graph: &ModuleGraph) -> Vec<DuplicateRecord> {
        let mut groups: BTreeMap<String, BTreeMap<String, BTreeSet<PathBuf>>> = BTreeMap::new();

        for module in graph.modules() {
            if let Some(pkg) = &module.package {
                groups
                    .entry(self.identity_of(pkg))
                    .or_default()
                    .entry(pkg.version.clone())
                    .or_default();
            }

            for dep in &module.deps {
                let Some(pkg) = &graph.module(dep.target).package else {
                    continue;
                };
                // Imports within one installed copy say nothing about who pulled it in
                if module.package.as_ref().is_some_and(|own| own.root == pkg.root) {
                    continue;
                }
                groups
                    .entry(self.identity_of(pkg))
                    .or_default()
                    .entry(pkg.version.clone())
                    .or_default()
                    .insert(module.path.clone());
            }
        }

        groups
            .into_iter()
            .filter(|(_, versions)| versions.len() > 1)
            .map(|(package, versions)| DuplicateRecord { package, versions })
            .collect()
    }
}

/// Log all records as one post-build summary.
pub fn log_summary(records: &[DuplicateRecord]) {
    if records.is_empty() {
        return;
    }
    log!(
        "duplicates";
        "{} resolved to more than one version",
        plural_count(records.len(), "package")
    );
    for record in records {
        log!("duplicates"; "  {}", record);
        for (version, importers) in &record.versions {
            for importer in importers {
                log!("duplicates"; "    {} ← {}", version, importer.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::path::normalize_path;
    use crate::utils::testutil::{graph_for, write};
    use tempfile::TempDir;

    fn two_versions(root: &std::path::Path) {
        write(root, "index.js", "import './a.js';\nimport './b/index.js';\nimport 'lib';");
        write(root, "a.js", "import 'lib/util';");
        write(root, "b/index.js", "import 'lib';");
        write(root, "node_modules/lib/package.json", r#"{"name":"lib","version":"1.0.0"}"#);
        write(root, "node_modules/lib/index.js", "import './util.js';");
        write(root, "node_modules/lib/util.js", "export const u = 1;");
        write(root, "b/node_modules/lib/package.json", r#"{"name":"lib","version":"2.0.0"}"#);
        write(root, "b/node_modules/lib/index.js", "export default 2;");
    }

    #[test]
    fn test_two_versions_reported_with_importers() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        two_versions(&root);

        let graph = graph_for(&root, &[("main", "index.js")]);
        let records = DuplicateDetector::new(DuplicateIdentity::Package).detect(&graph);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.package, "lib");
        assert_eq!(
            record.versions["1.0.0"],
            BTreeSet::from([root.join("a.js"), root.join("index.js")])
        );
        assert_eq!(record.versions["2.0.0"], BTreeSet::from([root.join("b/index.js")]));
        assert_eq!(record.to_string(), "lib (1.0.0, 2.0.0)");
    }

    #[test]
    fn test_module_identity_separates_subpaths() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        two_versions(&root);

        let graph = graph_for(&root, &[("main", "index.js")]);
        let records = DuplicateDetector::new(DuplicateIdentity::Module).detect(&graph);

        // Only `lib/index.js` exists at both versions; `lib/util.js` is unique
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].package, "lib/index.js");
    }

    #[test]
    fn test_single_version_is_clean() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "index.js", "import 'lib';\nimport 'lib/util';");
        write(&root, "node_modules/lib/package.json", r#"{"version":"1.0.0"}"#);
        write(&root, "node_modules/lib/index.js", "");
        write(&root, "node_modules/lib/util.js", "");

        let graph = graph_for(&root, &[("main", "index.js")]);
        assert!(DuplicateDetector::new(DuplicateIdentity::Package).detect(&graph).is_empty());
    }
}
