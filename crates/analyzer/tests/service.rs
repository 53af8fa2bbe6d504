//! GraphService operations against the in-memory store

use async_trait::async_trait;
use codemap_analyzer::{AnalyzeRequest, AnalyzerError, GraphService, ServiceConfig};
use codemap_graph::{BuildProgress, DiagramKind, DiagramOptions, FileChange, ProjectGraph, SourceFile};
use codemap_store::{GraphStore, MemoryGraphStore, StoreError};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn service() -> (GraphService, Arc<MemoryGraphStore>) {
    let store = Arc::new(MemoryGraphStore::new());
    (GraphService::new(store.clone(), ServiceConfig::default()), store)
}

fn project() -> Vec<SourceFile> {
    vec![
        SourceFile::new("src/a.js", "export function foo() {}"),
        SourceFile::new(
            "src/b.js",
            "import { foo } from './a.js';\nexport function bar() { if (foo()) { return 1; } return 2; }",
        ),
        SourceFile::new("src/c.js", "import { bar } from './b';\nimport _ from 'lodash';\nbar();"),
    ]
}

fn request() -> AnalyzeRequest {
    AnalyzeRequest::new("user-1", "shop", "main").with_persistent_id("shop-project")
}

#[tokio::test]
async fn test_analyze_commits_graph() {
    let (service, store) = service();
    let graph = service.analyze(&request(), &project()).await.unwrap();

    assert_eq!(graph.user_id, "user-1");
    assert_eq!(graph.persistent_project_id.as_deref(), Some("shop-project"));
    assert_eq!(graph.stats.total_files, 3);
    assert_eq!(graph.stats.total_edges, 2);
    assert_eq!(graph.expires_at - graph.analyzed_at, 24 * 3600 * 1000);

    let stored = store.get(&graph.project_id).await.unwrap();
    assert_eq!(stored, Some(graph));
}

#[tokio::test]
async fn test_reads_are_scoped_to_owner() {
    let (service, _) = service();
    let graph = service.analyze(&request(), &project()).await.unwrap();

    assert!(service.get_graph(&graph.project_id, "user-1").await.unwrap().is_some());
    assert!(service.get_graph(&graph.project_id, "intruder").await.unwrap().is_none());
    assert!(service.get_graph("unknown", "user-1").await.unwrap().is_none());
    assert!(service
        .get_file_context(&graph.project_id, "src/a.js", "intruder")
        .await
        .unwrap()
        .is_none());
    assert!(service
        .generate_diagram(&graph.project_id, "intruder", &DiagramOptions::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_expired_graphs_are_invisible_and_swept() {
    let store = Arc::new(MemoryGraphStore::new());
    let config = ServiceConfig {
        ttl: Duration::ZERO,
        ..ServiceConfig::default()
    };
    let service = GraphService::new(store.clone(), config);
    let graph = service.analyze(&request(), &project()).await.unwrap();

    assert!(service.get_graph(&graph.project_id, "user-1").await.unwrap().is_none());
    assert_eq!(store.len().await, 1);
    assert_eq!(service.sweep_expired().await.unwrap(), 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_file_context_summarises_neighbours() {
    let (service, _) = service();
    let graph = service.analyze(&request(), &project()).await.unwrap();

    let context = service
        .get_file_context(&graph.project_id, "src/b.js", "user-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(context.dependents, vec!["src/c.js".to_string()]);
    assert_eq!(context.dependencies, vec!["src/a.js".to_string()]);
    assert_eq!(context.node.functions[0].name, "bar");
    assert!(context.summary.contains("Used by 1 file: src/c.js"));
    assert!(context.summary.contains("Depends on 1 file: src/a.js"));

    assert!(service
        .get_file_context(&graph.project_id, "src/missing.js", "user-1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_diagram_from_stored_graph() {
    let (service, _) = service();
    let graph = service.analyze(&request(), &project()).await.unwrap();

    let options = DiagramOptions {
        kind: DiagramKind::Dependency,
        focus_file: Some("src/b.js".into()),
        ..DiagramOptions::default()
    };
    let text = service
        .generate_diagram(&graph.project_id, "user-1", &options)
        .await
        .unwrap()
        .unwrap();
    assert!(text.starts_with("graph TD"));
    assert!(text.contains("srcbjs --> srcajs"));
    assert!(text.contains("srccjs --> srcbjs"));
}

#[tokio::test]
async fn test_refresh_keeps_id_and_patches_edges() {
    let (service, store) = service();
    let original = service.analyze(&request(), &project()).await.unwrap();

    let changes = vec![
        FileChange::Upsert(SourceFile::new(
            "src/a.js",
            "import { d } from './d.js';\nexport function foo() { return d; }",
        )),
        FileChange::Upsert(SourceFile::new("src/d.js", "export const d = 1;")),
        FileChange::Remove("src/c.js".into()),
    ];
    let refreshed = service
        .refresh(&original.project_id, "user-1", &changes)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(refreshed.project_id, original.project_id);
    assert!(refreshed.analyzed_at >= original.analyzed_at);
    let ids: Vec<&str> = refreshed.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["src/a.js", "src/b.js", "src/d.js"]);

    let edges: Vec<(&str, &str)> = refreshed
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(edges, vec![("src/a.js", "src/d.js"), ("src/b.js", "src/a.js")]);

    // The untouched file keeps its stored analysis.
    assert_eq!(refreshed.nodes[1].functions, original.nodes[1].functions);
    assert_eq!(refreshed.nodes[1].dependent_count, 0);

    let stored: ProjectGraph = store.get(&original.project_id).await.unwrap().unwrap();
    assert_eq!(stored, refreshed);
}

#[tokio::test]
async fn test_refresh_and_rebuild_need_an_owned_graph() {
    let (service, _) = service();
    let graph = service.analyze(&request(), &project()).await.unwrap();

    assert!(service.refresh(&graph.project_id, "intruder", &[]).await.unwrap().is_none());
    assert!(service.rebuild("missing", "user-1", &project()).await.unwrap().is_none());

    let rebuilt = service
        .rebuild(&graph.project_id, "user-1", &project()[..1])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rebuilt.project_id, graph.project_id);
    assert_eq!(rebuilt.stats.total_files, 1);
}

#[tokio::test]
async fn test_latest_analysis_for_persistent_project() {
    let (service, _) = service();
    let first = service.analyze(&request(), &project()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = service.analyze(&request(), &project()[..2]).await.unwrap();
    assert_ne!(first.project_id, second.project_id);

    let latest = service
        .get_graph_for_project("shop-project", "user-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.project_id, second.project_id);
    assert!(service
        .get_graph_for_project("shop-project", "someone-else")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_progress_callback_sees_every_chunk() {
    let store = Arc::new(MemoryGraphStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let config = ServiceConfig {
        chunk_size: 2,
        ..ServiceConfig::default()
    };
    let service = GraphService::new(store, config).with_progress(Arc::new(move |_: &BuildProgress| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let graph = service.analyze(&request(), &project()).await.unwrap();
    assert_eq!(graph.stats.chunk_count, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Memory store whose writes fail while `fail_writes` is set
#[derive(Default)]
struct FlakyStore {
    inner: MemoryGraphStore,
    fail_writes: AtomicBool,
}

#[async_trait]
impl GraphStore for FlakyStore {
    async fn upsert(&self, graph: &ProjectGraph) -> codemap_store::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::IoError(std::io::Error::other("disk full")));
        }
        self.inner.upsert(graph).await
    }

    async fn get(&self, project_id: &str) -> codemap_store::Result<Option<ProjectGraph>> {
        self.inner.get(project_id).await
    }

    async fn latest_for_project(
        &self,
        persistent_project_id: &str,
        user_id: &str,
    ) -> codemap_store::Result<Option<ProjectGraph>> {
        self.inner.latest_for_project(persistent_project_id, user_id).await
    }

    async fn sweep_expired(&self) -> codemap_store::Result<usize> {
        self.inner.sweep_expired().await
    }
}

#[tokio::test]
async fn test_store_failures_reach_the_caller() {
    let store = Arc::new(FlakyStore::default());
    let service = GraphService::new(store.clone(), ServiceConfig::default());

    store.fail_writes.store(true, Ordering::SeqCst);
    let err = service.analyze(&request(), &project()).await.unwrap_err();
    assert!(matches!(err, AnalyzerError::Store(StoreError::IoError(_))));
    assert!(store.inner.is_empty().await);

    store.fail_writes.store(false, Ordering::SeqCst);
    let original = service.analyze(&request(), &project()).await.unwrap();

    store.fail_writes.store(true, Ordering::SeqCst);
    let changes = vec![FileChange::Remove("src/c.js".into())];
    let err = service
        .refresh(&original.project_id, "user-1", &changes)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::Store(_)));
    let err = service
        .rebuild(&original.project_id, "user-1", &project()[..1])
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::Store(_)));

    // The committed graph is untouched by the failed writes.
    let stored = service.get_graph(&original.project_id, "user-1").await.unwrap();
    assert_eq!(stored, Some(original));
}
