//! Style extraction.
//!
//! Splits a chunk's modules into the stylesheet and the script bundle.
//! Both sides keep the chunk's dependency order, so a stylesheet imported
//! by another always precedes it.

use super::chunk::Chunk;
use crate::graph::{ModuleGraph, ModuleId};

/// A chunk partitioned by output kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitChunk {
    pub name: String,
    pub script: Vec<ModuleId>,
    pub style: Vec<ModuleId>,
}

pub fn split(chunk: &Chunk, graph: &ModuleGraph) -> SplitChunk {
    let (style, script): (Vec<ModuleId>, Vec<ModuleId>) = chunk
        .modules
        .iter()
        .copied()
        .partition(|&id| graph.module(id).style);
    SplitChunk {
        name: chunk.name.clone(),
        script,
        style,
    }
}

/// Concatenate stylesheet outputs with a newline between them.
///
/// `None` when there are none: such a chunk emits no style asset.
pub fn concat(graph: &ModuleGraph, ids: &[ModuleId]) -> Option<Vec<u8>> {
    let (first, rest) = ids.split_first()?;
    let mut out = graph.module(*first).output.code.clone();
    for id in rest {
        out.push(b'\n');
        out.extend_from_slice(&graph.module(*id).output.code);
    }
    Some(out)
}
