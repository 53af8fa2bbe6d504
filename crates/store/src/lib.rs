//! # Codemap Store
//!
//! Keyed persistence for committed [`ProjectGraph`]s.
//!
//! Reads never return a graph whose `expiresAt` has passed; expired records
//! linger until [`GraphStore::sweep_expired`] (or [`spawn_sweeper`]) purges
//! them. Writes are whole-record, last writer wins.
//!
//! ## Example
//!
//! ```no_run
//! use codemap_store::{GraphStore, JsonFileGraphStore};
//!
//! #[tokio::main]
//! async fn main() -> codemap_store::Result<()> {
//!     let store = JsonFileGraphStore::new(".codemap/graphs");
//!     if let Some(graph) = store.get("3f2a9c").await? {
//!         println!("{} files", graph.stats.total_files);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod file;
mod memory;

pub use error::{Result, StoreError};
pub use file::JsonFileGraphStore;
pub use memory::MemoryGraphStore;

use async_trait::async_trait;
use codemap_graph::ProjectGraph;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Persistence port for project graphs
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Insert or replace the graph stored under `graph.project_id`
    async fn upsert(&self, graph: &ProjectGraph) -> Result<()>;

    /// Unexpired graph stored under `project_id`
    async fn get(&self, project_id: &str) -> Result<Option<ProjectGraph>>;

    /// Newest unexpired graph (by `analyzedAt`) for a persistent project owned by `user_id`
    async fn latest_for_project(
        &self,
        persistent_project_id: &str,
        user_id: &str,
    ) -> Result<Option<ProjectGraph>>;

    /// Delete expired graphs, returning how many were removed
    async fn sweep_expired(&self) -> Result<usize>;
}

/// Run [`GraphStore::sweep_expired`] every `period` until the handle is aborted
pub fn spawn_sweeper(store: Arc<dyn GraphStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => log::info!("Swept {removed} expired graphs"),
                Err(err) => log::warn!("Graph sweep failed: {err}"),
            }
        }
    })
}

pub(crate) fn newest_owned<'a>(
    graphs: impl Iterator<Item = &'a ProjectGraph>,
    persistent_project_id: &str,
    user_id: &str,
    now_ms: u64,
) -> Option<&'a ProjectGraph> {
    graphs
        .filter(|g| g.user_id == user_id)
        .filter(|g| g.persistent_project_id.as_deref() == Some(persistent_project_id))
        .filter(|g| !g.is_expired_at(now_ms))
        .max_by_key(|g| g.analyzed_at)
}
