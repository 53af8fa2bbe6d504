use crate::builder::{assemble, pending_edges_for, resolve_edges, ChunkedGraphBuilder, PendingEdge, SourceFile};
use crate::types::{AssembledGraph, GraphNode};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// One file-level change applied by [`ChunkedGraphBuilder::apply_changes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// Added or modified file
    Upsert(SourceFile),
    /// Deleted file, by root-relative path
    Remove(String),
}

impl FileChange {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Upsert(file) => &file.path,
            Self::Remove(path) => path,
        }
    }
}

impl ChunkedGraphBuilder {
    /// Patch an existing node set instead of rebuilding it.
    ///
    /// Only upserted files are parsed. Untouched nodes are reused as-is, and
    /// every edge is re-resolved from the stored imports against the new
    /// manifest, so edges into added or removed files come and go correctly.
    /// Later changes to the same path override earlier ones.
    pub async fn apply_changes(
        &mut self,
        previous: Vec<GraphNode>,
        changes: &[FileChange],
    ) -> AssembledGraph {
        let started = Instant::now();

        let mut order: Vec<&str> = Vec::new();
        let mut latest: HashMap<&str, &FileChange> = HashMap::new();
        for change in changes {
            if latest.insert(change.path(), change).is_none() {
                order.push(change.path());
            }
        }

        let mut removed: HashSet<&str> = HashSet::new();
        let mut upserts: Vec<SourceFile> = Vec::new();
        for path in order {
            match latest.get(path) {
                Some(FileChange::Upsert(file)) => upserts.push(file.clone()),
                Some(FileChange::Remove(_)) => {
                    removed.insert(path);
                }
                None => {}
            }
        }

        let run = self.extract_chunked(&upserts, &HashSet::new()).await;
        let reparsed = run.extraction.nodes.len();
        let mut fresh: HashMap<String, GraphNode> = run
            .extraction
            .nodes
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect();

        let mut nodes = Vec::with_capacity(previous.len() + fresh.len());
        let mut kept = 0usize;
        for node in previous {
            if removed.contains(node.id.as_str()) {
                continue;
            }
            match fresh.remove(&node.id) {
                Some(updated) => nodes.push(updated),
                None => {
                    kept += 1;
                    nodes.push(node);
                }
            }
        }
        for file in &upserts {
            if let Some(added) = fresh.remove(&file.path) {
                nodes.push(added);
            }
        }

        let pending: Vec<PendingEdge> = nodes.iter().flat_map(pending_edges_for).collect();
        let manifest: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let edges = resolve_edges(&pending, &manifest);
        let assembled = assemble(nodes, edges, run.chunk_count, run.yield_points, started.elapsed());

        log::info!(
            "Patched dependency graph: {} reparsed, {} removed, {} kept, {} edges",
            reparsed,
            removed.len(),
            kept,
            assembled.stats.total_edges
        );
        assembled
    }
}
