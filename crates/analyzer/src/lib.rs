//! # Codemap Analyzer
//!
//! The operations surface of codemap: analyse a project, commit the graph,
//! then answer graph, file-context and diagram queries against the store.
//!
//! ## Flow
//!
//! ```text
//! Directory
//!     │
//!     ├──> SourceLoader (.gitignore aware, size / UTF-8 filtered)
//!     │      └─> SourceFile[]
//!     │
//!     ├──> GraphService::analyze
//!     │      ├─ ChunkedGraphBuilder
//!     │      ├─ derive_project_id + TTL stamp
//!     │      └─ GraphStore::upsert
//!     │
//!     └──> queries: get_graph, get_file_context, generate_diagram,
//!          refresh (incremental), rebuild, sweep_expired
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use codemap_analyzer::{AnalyzeRequest, GraphService, ServiceConfig};
//! use codemap_graph::SourceFile;
//! use codemap_store::MemoryGraphStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> codemap_analyzer::Result<()> {
//!     let service = GraphService::new(Arc::new(MemoryGraphStore::new()), ServiceConfig::default());
//!     let files = vec![SourceFile::new("a.js", "export const a = 1;")];
//!     let graph = service
//!         .analyze(&AnalyzeRequest::new("me", "demo", "main"), &files)
//!         .await?;
//!     println!("{} -> {} files", graph.project_id, graph.stats.total_files);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod loader;
mod project_id;
mod service;

pub use config::{
    BuildConfig, CodemapConfig, DiagramConfig, ScanConfig, StoreConfig, CONFIG_FILE_NAME,
};
pub use error::{AnalyzerError, Result};
pub use loader::SourceLoader;
pub use project_id::{derive_persistent_project_id, derive_project_id};
pub use service::{AnalyzeRequest, GraphService, ServiceConfig};
