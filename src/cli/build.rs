//! `build` command.

use anyhow::Result;
use std::time::Instant;
use tola_pack::utils::plural::plural_count;
use tola_pack::{BundleConfig, Bundler, NoHook, log};

/// Run one generation and print its summary.
pub fn build(mut config: BundleConfig, clean: bool) -> Result<()> {
    config.output.clean |= clean;

    let start = Instant::now();
    let mut bundler = Bundler::new(config)?.with_progress(true);
    let report = bundler.run(&NoHook)?;

    log!(
        "build";
        "{} ({} transformed, {} cached), {} written in {:.2?}",
        plural_count(report.modules, "module"),
        report.transformed,
        report.cached,
        plural_count(report.written, "file"),
        start.elapsed()
    );
    if report.pruned > 0 {
        log!("build"; "removed {}", plural_count(report.pruned, "stale file"));
    }
    Ok(())
}
