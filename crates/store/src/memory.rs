use crate::{newest_owned, GraphStore, Result};
use async_trait::async_trait;
use codemap_graph::{unix_now_ms, ProjectGraph};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store; graphs are replaced whole under the write lock
#[derive(Default)]
pub struct MemoryGraphStore {
    graphs: RwLock<HashMap<String, ProjectGraph>>,
}

impl MemoryGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.graphs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.graphs.read().await.is_empty()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert(&self, graph: &ProjectGraph) -> Result<()> {
        self.graphs
            .write()
            .await
            .insert(graph.project_id.clone(), graph.clone());
        Ok(())
    }

    async fn get(&self, project_id: &str) -> Result<Option<ProjectGraph>> {
        let now = unix_now_ms();
        Ok(self
            .graphs
            .read()
            .await
            .get(project_id)
            .filter(|g| !g.is_expired_at(now))
            .cloned())
    }

    async fn latest_for_project(
        &self,
        persistent_project_id: &str,
        user_id: &str,
    ) -> Result<Option<ProjectGraph>> {
        let now = unix_now_ms();
        let graphs = self.graphs.read().await;
        Ok(newest_owned(graphs.values(), persistent_project_id, user_id, now).cloned())
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let now = unix_now_ms();
        let mut graphs = self.graphs.write().await;
        let before = graphs.len();
        graphs.retain(|_, g| !g.is_expired_at(now));
        Ok(before - graphs.len())
    }
}
