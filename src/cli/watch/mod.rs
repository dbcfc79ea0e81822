//! `watch` command.
//!
//! ```text
//! notify ─► crossbeam channel ─► Debouncer (300 ms) ─► Bundler::run ─► WatchHook
//!                                      ▲
//! Ctrl+C ─► stop channel ──────────────┘ (select)
//! ```
//!
//! One bundler serves every generation, so unchanged modules come from the
//! transform cache. A failing generation only updates the status line; the
//! previously published manifest stays in place.

mod debouncer;

use anyhow::{Context, Result, anyhow, bail};
use crossbeam::channel::{self, select};
use notify::{RecursiveMode, Watcher};
use std::path::PathBuf;
use tola_pack::logger::{status_error, status_success, status_warning};
use tola_pack::utils::plural::plural_count;
use tola_pack::{
    BuildError, BuildReport, BundleConfig, Bundler, GenerationHook, Mode, debug, log,
};

use debouncer::Debouncer;

enum Step {
    Stop,
    Event(notify::Result<notify::Event>),
    Tick,
}

/// Reports each generation on the watch status line.
struct WatchHook;

impl GenerationHook for WatchHook {
    fn published(&self, report: &BuildReport) {
        status_success(&format!(
            "generation {}: {}, {} transformed, {} written",
            report.generation,
            plural_count(report.modules, "module"),
            report.transformed,
            plural_count(report.written, "file")
        ));
    }

    fn failed(&self, error: &BuildError) {
        status_error("build failed", &error.to_string());
    }
}

/// Refuse to watch in a mode that does not rebuild on change.
fn ensure_watch_mode(mode: Mode) -> Result<()> {
    if !mode.watch() {
        bail!(
            "watch requires development mode, but the build mode is {} (use --mode development)",
            mode
        );
    }
    Ok(())
}

pub fn watch(config: BundleConfig) -> Result<()> {
    ensure_watch_mode(config.mode()?)?;
    let root = config.root.clone();
    let config_path = config.config_path.clone();
    let ignored: Vec<PathBuf> = vec![config.output_dir().to_path_buf(), config.manifest_path()];
    let mut bundler = Bundler::new(config)?;

    // Watcher first, so edits made during the initial build are not lost
    let (event_tx, event_rx) = channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = event_tx.send(res);
    })
    .context("failed to create file watcher")?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", root.display()))?;

    let (stop_tx, stop_rx) = channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .map_err(|e| anyhow!("failed to set Ctrl+C handler: {}", e))?;

    log!("watch"; "watching {} ({} mode)", root.display(), bundler.mode());
    let hook = WatchHook;
    // Errors were reported by the hook; keep watching.
    let _ = bundler.run(&hook);

    let mut debouncer = Debouncer::new(ignored);
    loop {
        let step = select! {
            recv(stop_rx) -> _ => Step::Stop,
            recv(event_rx) -> msg => msg.map_or(Step::Stop, Step::Event),
            default(debouncer.sleep_duration()) => Step::Tick,
        };

        match step {
            Step::Stop => break,
            Step::Event(Ok(event)) => debouncer.add_event(&event),
            Step::Event(Err(e)) => log!("watch"; "notify error: {}", e),
            Step::Tick => {
                let Some(changes) = debouncer.take_if_ready() else {
                    continue;
                };
                if changes.contains(&config_path) {
                    status_warning("pack.toml changed, restart to apply");
                }
                debug!("watch"; "{} changed", plural_count(changes.len(), "file"));
                let _ = bundler.run(&hook);
            }
        }
    }

    log!("watch"; "stopped");
    Ok(())
}
