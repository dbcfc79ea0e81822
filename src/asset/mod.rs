//! Output side of a generation: minification, content-addressed writes,
//! static copies, HTML pages and stale-file pruning.

mod copy;
mod emit;
mod html;
pub mod minify;
mod prune;

pub use copy::{collect_files, copy_static};
pub use emit::{AssetEmitter, expand_template};
pub use html::{emit_page, inject};
pub use minify::Minifier;
pub use prune::prune_stale;
