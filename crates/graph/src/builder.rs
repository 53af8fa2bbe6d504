use crate::error::{GraphError, Result};
use crate::resolver::{python_module_specifier, resolve_import};
use crate::types::{AssembledGraph, EdgeType, GraphEdge, GraphNode, GraphStats};
use codemap_extractor::{ExportKind, Extractor, ImportKind, Language};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// One input file: root-relative `/`-separated path plus its text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Reported after every processed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    /// 1-based
    pub chunk_index: usize,
    pub chunk_count: usize,
    pub files_processed: usize,
    pub total_files: usize,
}

pub type ProgressCallback = Arc<dyn Fn(&BuildProgress) + Send + Sync>;

#[derive(Clone)]
pub struct BuildOptions {
    pub chunk_size: usize,
    pub on_progress: Option<ProgressCallback>,
}

impl BuildOptions {
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: impl Fn(&BuildProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_progress: None,
        }
    }
}

impl std::fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOptions")
            .field("chunk_size", &self.chunk_size)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// An import not yet matched to a project file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdge {
    pub from: String,
    pub import_source: String,
    pub specifiers: Vec<String>,
    pub edge_type: EdgeType,
}

/// Output of the extraction stage
#[derive(Debug, Default)]
pub struct Extraction {
    pub nodes: Vec<GraphNode>,
    pub pending: Vec<PendingEdge>,
}

/// Build a dependency graph from source files in bounded chunks
///
/// Extraction runs chunk by chunk; edges are resolved only once every file is
/// known, so imports across chunk boundaries resolve like any other.
pub struct ChunkedGraphBuilder {
    options: BuildOptions,
    extractor: Extractor,
}

impl ChunkedGraphBuilder {
    pub fn new(options: BuildOptions) -> Result<Self> {
        if options.chunk_size == 0 {
            return Err(GraphError::InvalidChunkSize);
        }
        Ok(Self {
            options,
            extractor: Extractor::new(),
        })
    }

    #[must_use]
    pub const fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Full build: extract every file, then resolve and count
    pub async fn build(&mut self, files: &[SourceFile]) -> AssembledGraph {
        let started = Instant::now();
        let run = self.extract_chunked(files, &HashSet::new()).await;

        let manifest: HashSet<String> = run.extraction.nodes.iter().map(|n| n.id.clone()).collect();
        let edges = resolve_edges(&run.extraction.pending, &manifest);
        let assembled = assemble(
            run.extraction.nodes,
            edges,
            run.chunk_count,
            run.yield_points,
            started.elapsed(),
        );

        log::info!(
            "Built dependency graph: {} nodes, {} edges, {} chunks in {}ms",
            assembled.stats.total_files,
            assembled.stats.total_edges,
            assembled.stats.chunk_count,
            assembled.stats.processing_time_ms
        );
        assembled
    }

    /// Extract `files` chunk by chunk, yielding to the scheduler between chunks
    /// when there is more than one. Paths in `skip` and repeated paths are ignored.
    pub(crate) async fn extract_chunked(
        &mut self,
        files: &[SourceFile],
        skip: &HashSet<String>,
    ) -> ChunkedRun {
        let chunk_size = self.options.chunk_size;
        let chunk_count = files.len().div_ceil(chunk_size);
        let cooperative = files.len() > chunk_size;

        let mut seen = skip.clone();
        let mut run = ChunkedRun {
            extraction: Extraction::default(),
            chunk_count,
            yield_points: 0,
        };
        let mut processed = 0;

        for (index, chunk) in files.chunks(chunk_size).enumerate() {
            if index > 0 && cooperative {
                tokio::task::yield_now().await;
                run.yield_points += 1;
            }

            let extraction = self.extract_chunk(chunk, &mut seen);
            log::debug!(
                "Chunk {}/{}: {} nodes, {} pending edges",
                index + 1,
                chunk_count,
                extraction.nodes.len(),
                extraction.pending.len()
            );
            run.extraction.nodes.extend(extraction.nodes);
            run.extraction.pending.extend(extraction.pending);

            processed += chunk.len();
            if let Some(callback) = &self.options.on_progress {
                callback(&BuildProgress {
                    chunk_index: index + 1,
                    chunk_count,
                    files_processed: processed,
                    total_files: files.len(),
                });
            }
        }

        run
    }

    /// Stage one for a single chunk: nodes plus unresolved edges
    pub fn extract_chunk(&mut self, chunk: &[SourceFile], seen: &mut HashSet<String>) -> Extraction {
        let mut extraction = Extraction::default();
        for file in chunk {
            if !seen.insert(file.path.clone()) {
                log::warn!("Duplicate path {} ignored", file.path);
                continue;
            }
            let node = self.extract_node(file);
            extraction.pending.extend(pending_edges_for(&node));
            extraction.nodes.push(node);
        }
        extraction
    }

    pub(crate) fn extract_node(&mut self, file: &SourceFile) -> GraphNode {
        let language = Language::from_path(&file.path);
        let extractor = &mut self.extractor;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            extractor.extract_file(Some(&file.path), &file.content, language)
        }));

        match outcome {
            Ok(analysis) => GraphNode::from_analysis(file.path.clone(), language, analysis),
            Err(_) => {
                log::error!("Extraction panicked for {}, keeping an empty node", file.path);
                // The parser state may be poisoned after a panic.
                self.extractor = Extractor::new();
                GraphNode::empty(file.path.clone(), language)
            }
        }
    }
}

pub(crate) struct ChunkedRun {
    pub extraction: Extraction,
    pub chunk_count: usize,
    pub yield_points: usize,
}

/// Unresolved edges implied by a node's imports and re-exports, in source
/// line order (imports first within a line)
#[must_use]
pub fn pending_edges_for(node: &GraphNode) -> Vec<PendingEdge> {
    let imports = node.imports.iter().map(|import| {
        let import_source = match node.language {
            Language::Python => python_module_specifier(&import.source),
            _ => None,
        }
        .unwrap_or_else(|| import.source.clone());
        let edge = PendingEdge {
            from: node.id.clone(),
            import_source,
            specifiers: import
                .specifiers
                .iter()
                .map(|s| s.edge_label().to_string())
                .collect(),
            edge_type: if import.kind == ImportKind::Dynamic {
                EdgeType::Dynamic
            } else {
                EdgeType::Import
            },
        };
        (import.line, edge)
    });

    let reexports = node.exports.iter().filter_map(|export| {
        let source = export.source.as_ref()?;
        matches!(export.kind, ExportKind::Reexport | ExportKind::Namespace).then(|| {
            let edge = PendingEdge {
                from: node.id.clone(),
                import_source: source.clone(),
                specifiers: vec![export.name.clone()],
                edge_type: EdgeType::Reexport,
            };
            (export.line, edge)
        })
    });

    let mut edges: Vec<(usize, PendingEdge)> = imports.chain(reexports).collect();
    edges.sort_by_key(|(line, _)| *line);
    edges.into_iter().map(|(_, edge)| edge).collect()
}

/// Stage two: resolve pending edges against the complete manifest.
///
/// Unresolvable sources and self-imports produce no edge. Repeated
/// `(from, to)` pairs collapse into the first edge, whose specifier list
/// absorbs later specifiers in first-seen order.
#[must_use]
pub fn resolve_edges(pending: &[PendingEdge], manifest: &HashSet<String>) -> Vec<GraphEdge> {
    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut by_pair: HashMap<(String, String), usize> = HashMap::new();

    for edge in pending {
        let Some(to) = resolve_import(&edge.import_source, &edge.from, manifest) else {
            log::debug!("Unresolved import {} from {}", edge.import_source, edge.from);
            continue;
        };
        if to == edge.from {
            continue;
        }

        match by_pair.entry((edge.from.clone(), to.clone())) {
            Entry::Occupied(slot) => {
                let existing = &mut edges[*slot.get()];
                for specifier in &edge.specifiers {
                    if !existing.specifiers.contains(specifier) {
                        existing.specifiers.push(specifier.clone());
                    }
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(edges.len());
                let mut specifiers = Vec::with_capacity(edge.specifiers.len());
                for specifier in &edge.specifiers {
                    if !specifiers.contains(specifier) {
                        specifiers.push(specifier.clone());
                    }
                }
                edges.push(GraphEdge {
                    from: edge.from.clone(),
                    to,
                    specifiers,
                    edge_type: edge.edge_type,
                });
            }
        }
    }

    edges
}

/// Fill `dependent_count` / `dependency_count` from the resolved edges
pub fn assign_counts(nodes: &mut [GraphNode], edges: &[GraphEdge]) {
    let mut inbound: HashMap<&str, usize> = HashMap::new();
    let mut outbound: HashMap<&str, usize> = HashMap::new();
    for edge in edges {
        *inbound.entry(edge.to.as_str()).or_default() += 1;
        *outbound.entry(edge.from.as_str()).or_default() += 1;
    }
    for node in nodes {
        node.dependent_count = inbound.get(node.id.as_str()).copied().unwrap_or(0);
        node.dependency_count = outbound.get(node.id.as_str()).copied().unwrap_or(0);
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_stats(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    chunk_count: usize,
    elapsed: Duration,
) -> GraphStats {
    let total_complexity: u64 = nodes.iter().map(|n| u64::from(n.complexity)).sum();
    let average_complexity = if nodes.is_empty() {
        0.0
    } else {
        ((total_complexity as f64 / nodes.len() as f64) * 100.0).round() / 100.0
    };
    let languages: BTreeSet<&str> = nodes
        .iter()
        .map(|n| n.language)
        .filter(|l| *l != Language::Unknown)
        .map(Language::as_str)
        .collect();

    GraphStats {
        total_files: nodes.len(),
        total_functions: nodes.iter().map(|n| n.functions.len()).sum(),
        total_classes: nodes.iter().map(|n| n.classes.len()).sum(),
        total_exports: nodes.iter().map(|n| n.exports.len()).sum(),
        total_edges: edges.len(),
        average_complexity,
        max_dependents: nodes.iter().map(|n| n.dependent_count).max().unwrap_or(0),
        languages: languages.into_iter().map(str::to_string).collect(),
        chunk_count,
        processing_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}

pub(crate) fn assemble(
    mut nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    chunk_count: usize,
    yield_points: usize,
    elapsed: Duration,
) -> AssembledGraph {
    assign_counts(&mut nodes, &edges);
    let stats = compute_stats(&nodes, &edges, chunk_count, elapsed);
    AssembledGraph {
        nodes,
        edges,
        stats,
        yield_points,
    }
}
