//! tola-pack: a content-addressed asset bundler.
//!
//! Named entry points are resolved into a module graph, every module runs
//! through the transform chain of the first matching rule, and each entry
//! becomes one chunk with at most one script and one stylesheet. Outputs
//! are named by a digest of their final bytes and listed in a manifest that
//! is published atomically at the end of each build generation.
//!
//! ```text
//! pack.toml ─► BundleConfig ─► Bundler::build
//!                                 ├─ graph     (rule + transform, parallel per frontier)
//!                                 ├─ bundle    (chunks, style extraction)
//!                                 ├─ duplicate (package versions)
//!                                 ├─ asset     (minify, emit, copies, pages)
//!                                 └─ manifest  (stage + rename)
//! ```

pub mod asset;
pub mod bundle;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod graph;
pub mod hash;
pub mod logger;
pub mod manifest;
pub mod pipeline;
pub mod rule;
pub mod transform;
pub mod utils;

pub use config::{BundleConfig, Mode};
pub use error::{BuildError, BuildResult};
pub use pipeline::{BuildReport, Bundler, GenerationHook, NoHook};
