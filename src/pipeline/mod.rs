//! One build generation, end to end.
//!
//! ```text
//! config ──► EntryGraph ══barrier══► chunks + styles ──► duplicates
//!                                                           │
//!           emit (minify, hash, stage) ◄────────────────────┘
//!              ║ barrier
//!           commit outputs ──► rename manifest ──► prune stale outputs
//!                                                        │
//!                                       GenerationHook::published
//! ```
//!
//! A [`Bundler`] lives across generations so the transform cache carries
//! over between watch-mode rebuilds. Everything else (graph, chunks,
//! claims, manifest entries) is rebuilt from scratch per generation, and a
//! failing generation never reaches manifest publication.


use rayon::{ThreadPool, ThreadPoolBuilder};
use rustc_hash::FxHashSet;

use crate::asset::{AssetEmitter, Minifier, copy_static, emit_page, prune_stale};
use crate::bundle::{Bundle, assemble};
use crate::config::{BundleConfig, Mode};
use crate::debug;
use crate::duplicate::{self, DuplicateDetector, DuplicateRecord};
use crate::error::{BuildError, BuildResult};
use crate::graph::{EntryGraph, ModuleGraph, Resolver};
use crate::logger::ProgressLine;
use crate::manifest::{Manifest, ManifestWriter};
use crate::rule::RuleDispatcher;
use crate::transform::TransformCache;

// ============================================================================
// Hook
// ============================================================================

/// Observer of generation outcomes (dev server, reload transport).
pub trait GenerationHook {
    /// Called after the manifest of a generation has been published.
    fn published(&self, _report: &BuildReport) {}

    /// Called when a generation fails. Nothing of it was published.
    fn failed(&self, _error: &BuildError) {}
}

/// Hook that ignores every event.
pub struct NoHook;

impl GenerationHook for NoHook {}

/// Summary of one published generation.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// 1-based generation counter of the bundler.
    pub generation: u64,
    pub manifest: Manifest,
    /// Output files whose content changed on disk.
    pub written: usize,
    /// Stale files removed after publication.
    pub pruned: usize,
    pub duplicates: Vec<DuplicateRecord>,
    pub modules: usize,
    pub transformed: usize,
    pub cached: usize,
}

// ============================================================================
// Bundler
// ============================================================================

pub struct Bundler {
    config: BundleConfig,
    mode: Mode,
    rules: RuleDispatcher,
    resolver: Resolver,
    pool: ThreadPool,
    cache: TransformCache,
    minifier: Option<Minifier>,
    generation: u64,
    progress: bool,
}

impl Bundler {
    /// Validate `config` and prepare the long-lived build state.
    ///
    /// A missing mode is reported before anything else, then every
    /// configuration problem at once.
    pub fn new(config: BundleConfig) -> BuildResult<Self> {
        let mode = config.mode()?;
        config.validate()?;

        let rules = RuleDispatcher::from_config(&config.rules, &config.root)?;
        let resolver = Resolver::new(&config.resolve, &config.root);
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers())
            .thread_name(|i| format!("pack-worker-{i}"))
            .build()
            .map_err(|e| BuildError::Configuration(format!("cannot start worker pool: {e}")))?;
        let minifier = mode.minify().then(|| Minifier::new(&config.minify));

        debug!(
            "build";
            "{} mode, {} rule(s), {} worker(s)",
            mode,
            rules.len(),
            config.workers()
        );

        Ok(Self {
            config,
            mode,
            rules,
            resolver,
            pool,
            cache: TransformCache::new(),
            minifier,
            generation: 0,
            progress: false,
        })
    }

    /// Show a live module counter while the graph resolves.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cache(&self) -> &TransformCache {
        &self.cache
    }

    /// Run one generation and notify `hook` of the outcome.
    pub fn run(&mut self, hook: &dyn GenerationHook) -> BuildResult<BuildReport> {
        match self.build() {
            Ok(report) => {
                hook.published(&report);
                Ok(report)
            }
            Err(err) => {
                hook.failed(&err);
                Err(err)
            }
        }
    }

    /// Run one generation: resolve, bundle, emit, publish.
    pub fn build(&mut self) -> BuildResult<BuildReport> {
        self.generation += 1;

        let graph = self.resolve_graph()?;
        self.cache.prune(graph.live_keys());

        // Graph barrier passed; everything below sees the complete graph.
        let bundles = assemble(&graph)?;
        let duplicates =
            DuplicateDetector::new(self.config.duplicate_identity).detect(&graph);
        if self.config.strict_duplicates && !duplicates.is_empty() {
            return Err(BuildError::DuplicateModules(duplicates));
        }

        let mut emitter = AssetEmitter::new(self.config.output_dir(), self.config.output.hash_length);
        let mut manifest = ManifestWriter::new(&self.config.manifest_path());
        self.emit_bundles(bundles, &mut emitter, &mut manifest)?;
        self.emit_auxiliary(&graph, &mut emitter, &mut manifest)?;
        self.emit_static(&mut emitter, &mut manifest)?;

        // Outputs move into place only once every emit step has succeeded;
        // the manifest rename is the last step.
        let staged = manifest.stage()?;
        debug!("build"; "committing {} changed outputs", emitter.pending());
        emitter.commit()?;
        staged.commit()?;
        let written = emitter.written();
        let manifest = manifest.into_entries();
        debug!("build"; "published {} manifest entries", manifest.len());

        let pruned = if self.config.output.clean {
            let keep: FxHashSet<&str> = manifest.values().map(String::as_str).collect();
            prune_stale(self.config.output_dir(), &keep, &self.config.manifest_path())
        } else {
            0
        };

        duplicate::log_summary(&duplicates);

        Ok(BuildReport {
            generation: self.generation,
            manifest,
            written,
            pruned,
            duplicates,
            modules: graph.len(),
            transformed: graph.transformed,
            cached: graph.cached,
        })
    }

    fn resolve_graph(&self) -> BuildResult<ModuleGraph> {
        let progress = self
            .progress
            .then(|| ProgressLine::new(&["modules", "cached"]));

        let result = EntryGraph {
            rules: &self.rules,
            resolver: &self.resolver,
            cache: &self.cache,
            pool: &self.pool,
            progress: progress.as_ref(),
        }
        .resolve(&self.config.entries);

        if let Some(progress) = progress {
            progress.finish();
        }
        result
    }

    /// Minify (production) and write each chunk's script and stylesheet.
    fn emit_bundles(
        &self,
        bundles: Vec<Bundle>,
        emitter: &mut AssetEmitter,
        manifest: &mut ManifestWriter,
    ) -> BuildResult<()> {
        let output = &self.config.output;

        for bundle in bundles {
            if let Some(mut code) = bundle.script {
                if let Some(minifier) = &self.minifier {
                    code = minifier.script(&bundle.name, code);
                }
                let file = emitter.emit_hashed(&output.script, &bundle.name, "js", &code)?;
                manifest.insert(format!("{}.js", bundle.name), file)?;
            }
            if let Some(mut code) = bundle.style {
                if let Some(minifier) = &self.minifier {
                    code = minifier.style(&bundle.name, code);
                }
                let file = emitter.emit_hashed(&output.style, &bundle.name, "css", &code)?;
                manifest.insert(format!("{}.css", bundle.name), file)?;
            }
        }
        Ok(())
    }

    /// Files produced by `file` stages, under their own relative paths.
    fn emit_auxiliary(
        &self,
        graph: &ModuleGraph,
        emitter: &mut AssetEmitter,
        manifest: &mut ManifestWriter,
    ) -> BuildResult<()> {
        for module in graph.modules() {
            if let Some(file) = &module.output.emitted {
                let name = emitter.emit_fixed(&file.path, &file.bytes)?;
                manifest.insert(name.clone(), name)?;
            }
        }
        Ok(())
    }

    /// Static copies, then HTML pages (which reference chunk assets).
    fn emit_static(
        &self,
        emitter: &mut AssetEmitter,
        manifest: &mut ManifestWriter,
    ) -> BuildResult<()> {
        for copy in &self.config.static_copies {
            for name in copy_static(copy, emitter)? {
                manifest.insert(name.clone(), name)?;
            }
        }
        for page in &self.config.html {
            let name = emit_page(page, manifest.entries(), emitter)?;
            manifest.insert(name.clone(), name)?;
        }
        debug!(
            "build";
            "{} static copies, {} html pages",
            self.config.static_copies.len(),
            self.config.html.len()
        );
        Ok(())
    }
}
