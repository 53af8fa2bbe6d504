use crate::config::CodemapConfig;
use crate::error::Result;
use crate::project_id::derive_project_id;
use codemap_graph::{
    assemble_file_context, generate_diagram, unix_now_ms, BuildOptions, ChunkedGraphBuilder,
    ContextConfig, DiagramOptions, FileChange, FileContext, GraphIdentity, ProgressCallback,
    ProjectGraph, SourceFile, DEFAULT_CHUNK_SIZE,
};
use codemap_store::GraphStore;
use std::sync::Arc;
use std::time::Duration;

/// Who is analysing what
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeRequest {
    pub user_id: String,
    pub project_name: String,
    pub branch: String,
    /// Groups successive analyses of the same project
    pub persistent_project_id: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(
        user_id: impl Into<String>,
        project_name: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            project_name: project_name.into(),
            branch: branch.into(),
            persistent_project_id: None,
        }
    }

    #[must_use]
    pub fn with_persistent_id(mut self, id: impl Into<String>) -> Self {
        self.persistent_project_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub chunk_size: usize,
    pub ttl: Duration,
    pub context: ContextConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            ttl: Duration::from_secs(24 * 3600),
            context: ContextConfig::default(),
        }
    }
}

impl From<&CodemapConfig> for ServiceConfig {
    fn from(config: &CodemapConfig) -> Self {
        Self {
            chunk_size: config.build.chunk_size,
            ttl: config.store.ttl(),
            context: ContextConfig::default(),
        }
    }
}

/// Analysis, query and refresh operations over a [`GraphStore`].
///
/// Every read is scoped to the owning user: a graph owned by someone else
/// behaves exactly like a missing or expired one.
pub struct GraphService {
    store: Arc<dyn GraphStore>,
    config: ServiceConfig,
    on_progress: Option<ProgressCallback>,
}

impl GraphService {
    pub fn new(store: Arc<dyn GraphStore>, config: ServiceConfig) -> Self {
        Self {
            store,
            config,
            on_progress: None,
        }
    }

    /// Report build progress for every subsequent analysis
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn builder(&self) -> Result<ChunkedGraphBuilder> {
        let mut options = BuildOptions::default().with_chunk_size(self.config.chunk_size);
        options.on_progress = self.on_progress.clone();
        Ok(ChunkedGraphBuilder::new(options)?)
    }

    /// Build a graph from `files` and commit it under a freshly derived id
    pub async fn analyze(&self, request: &AnalyzeRequest, files: &[SourceFile]) -> Result<ProjectGraph> {
        let analyzed_at = unix_now_ms();
        let identity = GraphIdentity {
            project_id: derive_project_id(
                &request.user_id,
                &request.project_name,
                &request.branch,
                analyzed_at,
            ),
            persistent_project_id: request.persistent_project_id.clone(),
            user_id: request.user_id.clone(),
            project_name: request.project_name.clone(),
            branch: request.branch.clone(),
        };
        self.build_and_commit(identity, files, analyzed_at).await
    }

    /// Full re-analysis of an existing graph, kept under the same id
    pub async fn rebuild(
        &self,
        project_id: &str,
        user_id: &str,
        files: &[SourceFile],
    ) -> Result<Option<ProjectGraph>> {
        let Some(existing) = self.get_graph(project_id, user_id).await? else {
            return Ok(None);
        };
        let graph = self
            .build_and_commit(existing.identity(), files, unix_now_ms())
            .await?;
        Ok(Some(graph))
    }

    async fn build_and_commit(
        &self,
        identity: GraphIdentity,
        files: &[SourceFile],
        analyzed_at: u64,
    ) -> Result<ProjectGraph> {
        let assembled = self.builder()?.build(files).await;
        let graph = ProjectGraph::stamp(identity, assembled, analyzed_at, self.config.ttl);
        self.store.upsert(&graph).await?;
        log::info!(
            "Committed graph {} for {} ({} files)",
            graph.project_id,
            graph.project_name,
            graph.stats.total_files
        );
        Ok(graph)
    }

    /// Unexpired graph owned by `user_id`
    pub async fn get_graph(&self, project_id: &str, user_id: &str) -> Result<Option<ProjectGraph>> {
        Ok(self
            .store
            .get(project_id)
            .await?
            .filter(|graph| graph.user_id == user_id))
    }

    /// Newest unexpired analysis of a persistent project
    pub async fn get_graph_for_project(
        &self,
        persistent_project_id: &str,
        user_id: &str,
    ) -> Result<Option<ProjectGraph>> {
        Ok(self
            .store
            .latest_for_project(persistent_project_id, user_id)
            .await?)
    }

    /// One file with its direct neighbours and a text summary
    pub async fn get_file_context(
        &self,
        project_id: &str,
        file_path: &str,
        user_id: &str,
    ) -> Result<Option<FileContext>> {
        let Some(graph) = self.get_graph(project_id, user_id).await? else {
            return Ok(None);
        };
        Ok(assemble_file_context(&graph, file_path, self.config.context))
    }

    pub async fn generate_diagram(
        &self,
        project_id: &str,
        user_id: &str,
        options: &DiagramOptions,
    ) -> Result<Option<String>> {
        Ok(self
            .get_graph(project_id, user_id)
            .await?
            .map(|graph| generate_diagram(&graph, options)))
    }

    /// Apply file changes to a stored graph without re-parsing untouched
    /// files, and commit the result under the same id with a new TTL window
    pub async fn refresh(
        &self,
        project_id: &str,
        user_id: &str,
        changes: &[FileChange],
    ) -> Result<Option<ProjectGraph>> {
        let Some(existing) = self.get_graph(project_id, user_id).await? else {
            return Ok(None);
        };
        let identity = existing.identity();
        let assembled = self.builder()?.apply_changes(existing.nodes, changes).await;

        let graph = ProjectGraph::stamp(identity, assembled, unix_now_ms(), self.config.ttl);
        self.store.upsert(&graph).await?;
        log::info!(
            "Refreshed graph {} with {} changes ({} files)",
            graph.project_id,
            changes.len(),
            graph.stats.total_files
        );
        Ok(Some(graph))
    }

    /// Purge expired graphs from the store
    pub async fn sweep_expired(&self) -> Result<usize> {
        Ok(self.store.sweep_expired().await?)
    }
}
