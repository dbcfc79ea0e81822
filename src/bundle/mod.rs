//! Chunking and bundle assembly.
//!
//! Runs strictly after the graph is complete. Every entry yields one chunk;
//! each chunk yields at most one script bundle and one stylesheet.

mod chunk;
mod script;
mod style;

pub use chunk::{Chunk, build_chunks};
pub use script::bundle_scripts;
pub use style::{SplitChunk, concat, split};

use crate::error::BuildResult;
use crate::graph::{ModuleGraph, ModuleId};

/// Assembled, not yet minified, output of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub name: String,
    pub modules: Vec<ModuleId>,
    pub script: Option<Vec<u8>>,
    pub style: Option<Vec<u8>>,
}

/// Build every chunk's bundles, in entry-name order.
pub fn assemble(graph: &ModuleGraph) -> BuildResult<Vec<Bundle>> {
    build_chunks(graph)
        .into_iter()
        .map(|chunk| {
            let parts = split(&chunk, graph);
            Ok(Bundle {
                script: bundle_scripts(graph, &parts.script, chunk.entry)?,
                style: concat(graph, &parts.style),
                name: chunk.name,
                modules: chunk.modules,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::path::normalize_path;
    use crate::utils::testutil::{graph_for, write};
    use tempfile::TempDir;

    #[test]
    fn test_assemble_two_entries() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "index.js", "console.log('hi');");
        write(&root, "main.scss", "body { margin: 0 }");

        let graph = graph_for(&root, &[("main", "index.js"), ("styles", "main.scss")]);
        let bundles = assemble(&graph).unwrap();
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].name, "main");
        assert_eq!(bundles[0].script.as_deref(), Some(&b"console.log('hi');"[..]));
        assert!(bundles[0].style.is_none());
        assert_eq!(bundles[1].name, "styles");
        assert!(bundles[1].script.is_none());
        assert_eq!(bundles[1].style.as_deref(), Some(&b"body { margin: 0 }"[..]));
    }
}
