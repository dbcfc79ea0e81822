//! Command-line interface module.

mod args;
pub mod build;
pub mod watch;

pub use args::{Cli, Commands};

use anyhow::{Context, Result};
use std::env;
use tola_pack::{BundleConfig, Mode, config::find_config_file};

/// Environment variable consulted when neither `--mode` nor the config sets one.
const MODE_ENV: &str = "NODE_ENV";

/// Locate, load and finish the configuration for this invocation.
///
/// Mode precedence: `--mode`, then `NODE_ENV`, then `mode` in pack.toml.
pub fn load_config(cli: &Cli) -> Result<BundleConfig> {
    let cwd = env::current_dir().context("cannot read current directory")?;
    let path = find_config_file(&cwd, &cli.config).unwrap_or_else(|| cwd.join(&cli.config));
    let config = BundleConfig::load(&path)?;

    let mode = match cli.mode {
        Some(mode) => Some(mode),
        None => env_mode()?,
    };
    Ok(config.with_mode(mode))
}

fn env_mode() -> Result<Option<Mode>> {
    match env::var(MODE_ENV) {
        Ok(value) if !value.trim().is_empty() => value
            .parse()
            .map(Some)
            .map_err(|e: String| anyhow::anyhow!("{MODE_ENV}: {e}")),
        _ => Ok(None),
    }
}
