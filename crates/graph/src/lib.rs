//! # Codemap Graph
//!
//! Cross-file dependency graph assembled from per-file extraction results.
//!
//! ## Features
//!
//! - **Chunked building** - bounded batches with a cooperative yield in between
//! - **Import resolution** - relative / root-absolute specifiers probed against the manifest
//! - **Incremental refresh** - re-extract changed files only, re-resolve every edge
//! - **Neighbourhood queries** - dependents, dependencies, coupling (petgraph)
//! - **Diagrams** - architecture, dependency and data-flow views as Mermaid or DOT
//!
//! ## Architecture
//!
//! ```text
//! SourceFile[]
//!     │
//!     ├──> ChunkedGraphBuilder (stage 1, per chunk)
//!     │      ├─ Extractor: AST first, heuristic fallback
//!     │      └─ GraphNode + PendingEdge per import / re-export
//!     │
//!     ├──> resolve_edges (stage 2, full manifest known)
//!     │      ├─ resolve_import: normalise, probe extensions, /index
//!     │      └─ dedup (from, to), merge specifiers, drop self-edges
//!     │
//!     └──> AssembledGraph { nodes, edges, stats }
//!            ├─ GraphIndex: neighbourhood queries
//!            ├─ assemble_file_context: prompt-ready summaries
//!            └─ generate_diagram: DiagramLayout -> renderer
//! ```

mod builder;
mod context;
pub mod diagram;
mod error;
mod graph;
mod incremental;
mod resolver;
mod types;

pub use builder::{
    assign_counts, compute_stats, pending_edges_for, resolve_edges, BuildOptions, BuildProgress,
    ChunkedGraphBuilder, Extraction, PendingEdge, ProgressCallback, SourceFile,
    DEFAULT_CHUNK_SIZE,
};
pub use context::{assemble_file_context, ContextConfig, FileContext};
pub use diagram::{generate_diagram, DiagramFormat, DiagramKind, DiagramOptions};
pub use error::{GraphError, Result};
pub use graph::GraphIndex;
pub use incremental::FileChange;
pub use resolver::{is_external, resolve_import, PROBE_EXTENSIONS};
pub use types::{
    unix_now_ms, AssembledGraph, EdgeType, GraphEdge, GraphIdentity, GraphNode, GraphStats,
    ProjectGraph,
};
