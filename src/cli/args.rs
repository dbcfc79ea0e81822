//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;
use tola_pack::Mode;

/// Content-addressed asset bundler
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Build mode (development, production). Overrides NODE_ENV and pack.toml
    #[arg(short, long, global = true)]
    pub mode: Option<Mode>,

    /// Config file path (default: pack.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "pack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one build generation and publish the manifest
    #[command(visible_alias = "b")]
    Build {
        /// Remove outputs not referenced by the new manifest
        #[arg(short, long)]
        clean: bool,
    },

    /// Build, then rebuild on every change until Ctrl+C
    #[command(visible_alias = "w")]
    Watch,
}
