use rustc_hash::FxHashSet;

use crate::graph::{ModuleGraph, ModuleId};

/// Modules reachable from one entry, dependencies first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub name: String,
    pub entry: ModuleId,
    /// Post-order over imports: every module comes after the modules it
    /// imports, siblings in import order. Cycles are cut at the first
    /// revisit.
    pub modules: Vec<ModuleId>,
}

/// One chunk per entry, in entry-name order.
pub fn build_chunks(graph: &ModuleGraph) -> Vec<Chunk> {
    graph
        .entries()
        .iter()
        .map(|(name, &entry)| Chunk {
            name: name.clone(),
            entry,
            modules: post_order(graph, entry),
        })
        .collect()
}

fn post_order(graph: &ModuleGraph, entry: ModuleId) -> Vec<ModuleId> {
    let mut order = Vec::new();
    let mut visited = FxHashSet::default();
    // (module, index of the next dependency to visit)
    let mut stack = vec![(entry, 0usize)];
    visited.insert(entry);

    while let Some((id, next)) = stack.last_mut() {
        let deps = &graph.module(*id).deps;
        if let Some(dep) = deps.get(*next) {
            *next += 1;
            if visited.insert(dep.target) {
                stack.push((dep.target, 0));
            }
        } else {
            order.push(*id);
            stack.pop();
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::path::normalize_path;
    use crate::utils::testutil::{graph_for, write};
    use tempfile::TempDir;

    fn names(graph: &ModuleGraph, ids: &[ModuleId]) -> Vec<String> {
        ids.iter()
            .map(|&id| {
                graph.module(id).path.file_name().unwrap().to_string_lossy().into_owned()
            })
            .collect()
    }

    #[test]
    fn test_post_order_dependencies_first() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "src/index.js", "import './a';\nimport './b';\n");
        write(&root, "src/a.js", "import './shared';\n");
        write(&root, "src/b.js", "import './shared';\n");
        write(&root, "src/shared.js", "");

        let graph = graph_for(&root, &[("main", "src/index.js")]);
        let chunks = build_chunks(&graph);
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            names(&graph, &chunks[0].modules),
            vec!["shared.js", "a.js", "b.js", "index.js"]
        );
    }

    #[test]
    fn test_chunks_only_hold_reachable_modules() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        write(&root, "src/a.js", "import './common';\n");
        write(&root, "src/b.js", "import './other';\n");
        write(&root, "src/common.js", "");
        write(&root, "src/other.js", "import './b';\n");

        let graph = graph_for(&root, &[("a", "src/a.js"), ("b", "src/b.js")]);
        let chunks = build_chunks(&graph);
        assert_eq!(chunks[0].name, "a");
        assert_eq!(names(&graph, &chunks[0].modules), vec!["common.js", "a.js"]);
        // cycle b → other → b is cut at the revisit
        assert_eq!(names(&graph, &chunks[1].modules), vec!["other.js", "b.js"]);
    }
}
