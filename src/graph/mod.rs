//! Entry points → module dependency graph.
//!
//! Resolution is breadth-first. Each frontier is transformed on the worker
//! pool, then the finished modules' imports are resolved in frontier order
//! and modules seen for the first time form the next frontier. Module ids
//! are assigned in discovery order, which makes the graph (and everything
//! derived from it) independent of thread scheduling.
//!
//! ```text
//! entries ──► frontier 0 ──transform (parallel)──► resolve imports ──► frontier 1 ──► ...
//! ```

mod cycle;
mod glob;
mod package;
mod resolve;

pub use cycle::find_style_cycle;
pub use package::{PackageIndex, PackageJson, PackageRef};
pub use resolve::Resolver;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::ThreadPool;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::debug;
use crate::error::{BuildError, BuildResult};
use crate::hash::ContentHash;
use crate::logger::ProgressLine;
use crate::rule::RuleDispatcher;
use crate::transform::{CacheKey, ImportKind, TransformCache, TransformOutput};

pub type ModuleId = usize;

// ============================================================================
// Graph types
// ============================================================================

/// A resolved import edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub specifier: String,
    pub kind: ImportKind,
    pub target: ModuleId,
}

/// One module of a build generation. Immutable once the graph is built.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: ModuleId,
    /// Normalized absolute path; the module's identity.
    pub path: PathBuf,
    /// Hash of the raw file bytes.
    pub source_hash: ContentHash,
    /// Index of the rule that dispatched this module.
    pub rule: usize,
    /// Whether the module goes into the style bundle.
    pub style: bool,
    pub output: Arc<TransformOutput>,
    /// Resolved imports, in import order.
    pub deps: Vec<Dependency>,
    pub package: Option<PackageRef>,
}

#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    index: FxHashMap<PathBuf, ModuleId>,
    entries: BTreeMap<String, ModuleId>,
    /// Cache keys used by this generation.
    live_keys: FxHashSet<CacheKey>,
    /// Modules transformed (cache misses) in this generation.
    pub transformed: usize,
    /// Modules served from the transform cache.
    pub cached: usize,
}

impl ModuleGraph {
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id]
    }

    /// Chunk name → entry module, in name order.
    pub fn entries(&self) -> &BTreeMap<String, ModuleId> {
        &self.entries
    }

    pub fn live_keys(&self) -> &FxHashSet<CacheKey> {
        &self.live_keys
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// ============================================================================
// EntryGraph
// ============================================================================

/// Everything graph resolution needs, borrowed from the bundler.
pub struct EntryGraph<'a> {
    pub rules: &'a RuleDispatcher,
    pub resolver: &'a Resolver,
    pub cache: &'a TransformCache,
    pub pool: &'a ThreadPool,
    pub progress: Option<&'a ProgressLine>,
}

/// Result of transforming one module of a frontier.
struct Transformed {
    source_hash: ContentHash,
    rule: usize,
    style: bool,
    key: CacheKey,
    output: Arc<TransformOutput>,
    hit: bool,
}

impl EntryGraph<'_> {
    /// Build the module graph for all entries.
    ///
    /// Fails on the first unreadable file, unmatched path, transform
    /// failure or unresolved import, and on any style-import cycle.
    pub fn resolve(&self, entries: &BTreeMap<String, PathBuf>) -> BuildResult<ModuleGraph> {
        let mut graph = ModuleGraph::default();
        let mut packages = PackageIndex::new();
        let mut frontier: Vec<PathBuf> = Vec::new();

        for (name, path) in entries {
            let id = discover(&mut graph.index, &mut frontier, path.clone());
            graph.entries.insert(name.clone(), id);
        }

        let mut depth = 0;
        while !frontier.is_empty() {
            debug!("graph"; "frontier {}: {} module(s)", depth, frontier.len());
            let results = self.transform_frontier(&frontier)?;

            let first_id = graph.modules.len();
            for (path, done) in frontier.drain(..).zip(results) {
                if done.hit {
                    graph.cached += 1;
                } else {
                    graph.transformed += 1;
                }
                graph.live_keys.insert(done.key);
                let package = packages.lookup(&path);
                graph.modules.push(Module {
                    id: graph.modules.len(),
                    path,
                    source_hash: done.source_hash,
                    rule: done.rule,
                    style: done.style,
                    output: done.output,
                    deps: Vec::new(),
                    package,
                });
            }

            // Resolve imports in frontier order; new paths get the next ids.
            for id in first_id..graph.modules.len() {
                let deps = self.resolve_imports(&graph.modules[id], &mut graph.index, &mut frontier)?;
                graph.modules[id].deps = deps;
            }
            depth += 1;
        }

        if let Some(chain) = find_style_cycle(&graph.modules) {
            return Err(BuildError::CyclicStyleImport { chain });
        }
        Ok(graph)
    }

    /// Transform one frontier on the pool.
    ///
    /// The first failure stops the remaining work; the earliest failed
    /// module in frontier order is reported.
    fn transform_frontier(&self, frontier: &[PathBuf]) -> BuildResult<Vec<Transformed>> {
        let aborted = AtomicBool::new(false);

        let results: Vec<Option<BuildResult<Transformed>>> = self.pool.install(|| {
            frontier
                .par_iter()
                .map(|path| {
                    if aborted.load(Ordering::Relaxed) {
                        return None;
                    }
                    let result = self.transform_one(path);
                    if result.is_err() {
                        aborted.store(true, Ordering::Relaxed);
                    }
                    Some(result)
                })
                .collect()
        });

        // Skipped entries only exist when some module failed.
        results.into_iter().flatten().collect()
    }

    fn transform_one(&self, path: &Path) -> BuildResult<Transformed> {
        let bytes = fs::read(path).map_err(|e| BuildError::read(path, e))?;
        let (rule, chain) = self.rules.dispatch(path)?;

        let key = CacheKey {
            path: path.to_path_buf(),
            input: ContentHash::of(&bytes),
            chain: chain.config_hash(),
        };
        let (output, hit) = self
            .cache
            .get_or_transform(&key, || chain.apply(path, &bytes))?;

        if let Some(progress) = self.progress {
            progress.inc("modules");
            if hit {
                progress.inc("cached");
            }
        }

        Ok(Transformed {
            source_hash: key.input,
            rule,
            style: chain.is_style(),
            key,
            output,
            hit,
        })
    }

    fn resolve_imports(
        &self,
        module: &Module,
        index: &mut FxHashMap<PathBuf, ModuleId>,
        frontier: &mut Vec<PathBuf>,
    ) -> BuildResult<Vec<Dependency>> {
        let mut deps = Vec::with_capacity(module.output.imports.len());
        for import in &module.output.imports {
            for target in self.resolver.resolve_all(&module.path, import)? {
                deps.push(Dependency {
                    specifier: import.specifier.clone(),
                    kind: import.kind,
                    target: discover(index, frontier, target),
                });
            }
        }
        Ok(deps)
    }
}

/// Id of `path`, queueing it for the next frontier when first seen.
fn discover(
    index: &mut FxHashMap<PathBuf, ModuleId>,
    frontier: &mut Vec<PathBuf>,
    path: PathBuf,
) -> ModuleId {
    let next = index.len();
    *index.entry(path.clone()).or_insert_with(|| {
        frontier.push(path);
        next
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ResolveConfig;
    use crate::utils::path::normalize_path;
    use crate::utils::testutil::{rules, write};
    use tempfile::TempDir;

    /// Graph module fixture with the given style/script edges.
    pub(crate) fn module(id: ModuleId, path: &str, deps: &[(ModuleId, ImportKind)]) -> Module {
        Module {
            id,
            path: PathBuf::from(path),
            source_hash: ContentHash::of(path),
            rule: 0,
            style: path.ends_with("css"),
            output: Arc::new(TransformOutput {
                code: Vec::new(),
                imports: Vec::new(),
                emitted: None,
            }),
            deps: deps
                .iter()
                .map(|&(target, kind)| Dependency {
                    specifier: format!("#{target}"),
                    kind,
                    target,
                })
                .collect(),
            package: None,
        }
    }

    fn build(root: &Path, entries: &[(&str, &str)], cache: &TransformCache) -> BuildResult<ModuleGraph> {
        let dispatcher = RuleDispatcher::from_config(&rules(), root).unwrap();
        let resolver = Resolver::new(&ResolveConfig::default(), root);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let entries = entries
            .iter()
            .map(|(name, rel)| (name.to_string(), normalize_path(&root.join(rel))))
            .collect();
        EntryGraph {
            rules: &dispatcher,
            resolver: &resolver,
            cache,
            pool: &pool,
            progress: None,
        }
        .resolve(&entries)
    }

    #[test]
    fn test_ids_follow_breadth_first_discovery() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "src/index.js", "import './a';\nimport './b';\n");
        write(&root, "src/a.js", "import './c';\n");
        write(&root, "src/b.js", "import './a';\n");
        write(&root, "src/c.js", "export default 'c';\n");

        let cache = TransformCache::new();
        let graph = build(&root, &[("main", "src/index.js")], &cache).unwrap();

        let names: Vec<String> = graph
            .modules()
            .iter()
            .map(|m| m.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["index.js", "a.js", "b.js", "c.js"]);
        assert!(graph.modules().iter().enumerate().all(|(i, m)| m.id == i));
        assert_eq!(graph.entries()["main"], 0);
        // b.js → a.js reuses the existing module
        assert_eq!(graph.module(2).deps[0].target, 1);
        assert_eq!((graph.transformed, graph.cached), (4, 0));
    }

    #[test]
    fn test_script_cycle_is_allowed() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "src/a.js", "import './b';\n");
        write(&root, "src/b.js", "import './a';\n");

        let graph = build(&root, &[("main", "src/a.js")], &TransformCache::new()).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.module(1).deps[0].target, 0);
    }

    #[test]
    fn test_style_cycle_is_rejected() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "src/a.scss", "@import 'b';\n.a {}\n");
        write(&root, "src/b.scss", "@import 'a';\n.b {}\n");

        let err = build(&root, &[("styles", "src/a.scss")], &TransformCache::new()).unwrap_err();
        let BuildError::CyclicStyleImport { chain } = err else {
            panic!("expected cycle error, got {err}");
        };
        let names: Vec<_> = chain
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.scss", "b.scss", "a.scss"]);
    }

    #[test]
    fn test_style_glob_import_adds_one_edge_per_match() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "src/main.scss", "@import 'components/**/*.scss';\nbody {}\n");
        write(&root, "src/components/b.scss", ".b {}\n");
        write(&root, "src/components/a/_a.scss", ".a {}\n");

        let graph = build(&root, &[("styles", "src/main.scss")], &TransformCache::new()).unwrap();
        let targets: Vec<String> = graph
            .module(0)
            .deps
            .iter()
            .map(|d| graph.module(d.target).path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(targets, vec!["_a.scss", "b.scss"]);
        assert!(graph.module(0).deps.iter().all(|d| d.specifier == "components/**/*.scss"));
    }

    #[test]
    fn test_second_resolution_hits_cache() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "src/index.js", "import './a';\n");
        write(&root, "src/a.js", "export default 1;\n");

        let cache = TransformCache::new();
        build(&root, &[("main", "src/index.js")], &cache).unwrap();

        write(&root, "src/a.js", "export default 2;\n");
        let graph = build(&root, &[("main", "src/index.js")], &cache).unwrap();
        assert_eq!((graph.transformed, graph.cached), (1, 1));
    }

    #[test]
    fn test_errors_carry_context() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "src/index.js", "import './missing';\n");
        write(&root, "src/logo.bmp", "");

        let err = build(&root, &[("main", "src/index.js")], &TransformCache::new()).unwrap_err();
        assert!(matches!(err, BuildError::UnresolvedImport { ref specifier, .. } if specifier == "./missing"));

        let err = build(&root, &[("img", "src/logo.bmp")], &TransformCache::new()).unwrap_err();
        assert!(matches!(err, BuildError::NoMatchingRule(_)));
    }

    #[test]
    fn test_package_identity_attached() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "src/index.js", "import 'dep';\n");
        write(&root, "node_modules/dep/package.json", r#"{"version": "2.0.1"}"#);
        write(&root, "node_modules/dep/index.js", "export default 1;\n");

        let graph = build(&root, &[("main", "src/index.js")], &TransformCache::new()).unwrap();
        assert!(graph.module(0).package.is_none());
        let package = graph.module(1).package.as_ref().unwrap();
        assert_eq!(package.name, "dep");
        assert_eq!(package.version, "2.0.1");
    }
}
