//! Style-import cycle detection.
//!
//! Script graphs may be cyclic; style imports are inlined ahead of the
//! importer, so a cycle there has no valid order.

use std::path::PathBuf;

use super::{Module, ModuleId};
use crate::transform::ImportKind;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// The first style-import cycle found, as `[a, b, .., a]`.
///
/// Modules are visited in id order and edges in import order, so the
/// reported cycle is stable across runs.
pub fn find_style_cycle(modules: &[Module]) -> Option<Vec<PathBuf>> {
    let mut marks = vec![Mark::Unvisited; modules.len()];
    let mut stack = Vec::new();

    for id in 0..modules.len() {
        if marks[id] == Mark::Unvisited
            && let Some(cycle) = visit(modules, id, &mut marks, &mut stack)
        {
            return Some(cycle);
        }
    }
    None
}

fn visit(
    modules: &[Module],
    id: ModuleId,
    marks: &mut [Mark],
    stack: &mut Vec<ModuleId>,
) -> Option<Vec<PathBuf>> {
    marks[id] = Mark::OnStack;
    stack.push(id);

    for dep in &modules[id].deps {
        if dep.kind != ImportKind::Style {
            continue;
        }
        match marks[dep.target] {
            Mark::OnStack => {
                let start = stack.iter().position(|&m| m == dep.target).unwrap_or(0);
                let mut chain: Vec<PathBuf> = stack[start..]
                    .iter()
                    .map(|&m| modules[m].path.clone())
                    .collect();
                chain.push(modules[dep.target].path.clone());
                return Some(chain);
            }
            Mark::Unvisited => {
                if let Some(cycle) = visit(modules, dep.target, marks, stack) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[id] = Mark::Done;
    None
}
