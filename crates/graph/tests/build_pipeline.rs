//! End-to-end builds over small in-memory projects

use codemap_graph::{
    BuildOptions, ChunkedGraphBuilder, EdgeType, FileChange, GraphIdentity, ProjectGraph,
    SourceFile,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn builder() -> ChunkedGraphBuilder {
    ChunkedGraphBuilder::new(BuildOptions::default()).unwrap()
}

fn files(entries: &[(&str, &str)]) -> Vec<SourceFile> {
    entries
        .iter()
        .map(|(path, content)| SourceFile::new(*path, *content))
        .collect()
}

fn stamp(assembled: codemap_graph::AssembledGraph) -> ProjectGraph {
    let identity = GraphIdentity {
        project_id: "p1".into(),
        persistent_project_id: None,
        user_id: "u1".into(),
        project_name: "demo".into(),
        branch: "main".into(),
    };
    ProjectGraph::stamp(identity, assembled, 0, Duration::from_secs(3600))
}

#[tokio::test]
async fn test_import_between_two_files() {
    let input = files(&[
        ("a.js", "export function foo(){}"),
        (
            "b.js",
            "import { foo } from './a.js'; function bar(){ if (foo()) { return 1; } else { return 2; } }",
        ),
    ]);
    let graph = builder().build(&input).await;

    let a = &graph.nodes[0];
    let b = &graph.nodes[1];
    assert_eq!(a.exports.len(), 1);
    assert_eq!(a.exports[0].name, "foo");
    assert_eq!(b.functions.len(), 1);
    assert_eq!(b.functions[0].name, "bar");
    assert_eq!(b.functions[0].complexity, 2);

    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].from, "b.js");
    assert_eq!(graph.edges[0].to, "a.js");
    assert_eq!(graph.edges[0].specifiers, vec!["foo".to_string()]);
    assert_eq!(graph.edges[0].edge_type, EdgeType::Import);
    assert_eq!(a.dependent_count, 1);
    assert_eq!(b.dependency_count, 1);
}

#[tokio::test]
async fn test_large_input_is_chunked_with_yields() {
    let mut input: Vec<SourceFile> = (0..1_001)
        .map(|i| SourceFile::new(format!("src/f{i}.js"), format!("export const v{i} = {i};")))
        .collect();
    input[1_000].content = "import { v0 } from './f0.js';\nexport const last = v0;".into();

    let chunks_seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&chunks_seen);
    let options = BuildOptions::default()
        .with_chunk_size(500)
        .with_progress(move |progress| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(progress.chunk_count, 3);
            assert_eq!(progress.total_files, 1_001);
        });

    let graph = ChunkedGraphBuilder::new(options).unwrap().build(&input).await;

    assert_eq!(graph.stats.chunk_count, 3);
    assert_eq!(graph.yield_points, 2);
    assert_eq!(graph.nodes.len(), 1_001);
    assert_eq!(graph.stats.total_files, 1_001);
    assert_eq!(chunks_seen.load(Ordering::SeqCst), 3);

    // Import from the last chunk into the first one still resolves.
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].from, "src/f1000.js");
    assert_eq!(graph.edges[0].to, "src/f0.js");
}

#[tokio::test]
async fn test_single_chunk_never_yields() {
    let input = files(&[("a.js", "export const a = 1;"), ("b.js", "export const b = 2;")]);
    let graph = builder().build(&input).await;
    assert_eq!(graph.stats.chunk_count, 1);
    assert_eq!(graph.yield_points, 0);
}

#[tokio::test]
async fn test_external_packages_produce_no_edges() {
    let input = files(&[("app.js", "import x from 'lodash';\nexport default x;")]);
    let graph = builder().build(&input).await;

    assert!(graph.edges.is_empty());
    assert_eq!(graph.nodes[0].imports.len(), 1);
    assert_eq!(graph.nodes[0].dependency_count, 0);
}

#[tokio::test]
async fn test_repeated_imports_merge_specifiers() {
    let input = files(&[
        ("a.js", "export const x = 1; export const y = 2;"),
        ("b.js", "import { x } from './a';\nimport { y, x } from './a.js';\n"),
    ]);
    let graph = builder().build(&input).await;

    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].specifiers, vec!["x".to_string(), "y".to_string()]);
}

#[tokio::test]
async fn test_reexports_dynamic_imports_and_index_resolution() {
    let input = files(&[
        ("src/lib/index.ts", "export const core = 1;"),
        ("src/lib/extra.ts", "export const extra = 2;"),
        ("src/api.ts", "export { core } from './lib';\nexport * from './lib/extra';"),
        ("src/main.ts", "const api = import('./api');\n"),
        ("src/self.ts", "import { me } from './self';\nexport const me = 1;"),
    ]);
    let graph = builder().build(&input).await;

    let pairs: Vec<(&str, &str, EdgeType)> = graph
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str(), e.edge_type))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("src/api.ts", "src/lib/index.ts", EdgeType::Reexport),
            ("src/api.ts", "src/lib/extra.ts", EdgeType::Reexport),
            ("src/main.ts", "src/api.ts", EdgeType::Dynamic),
        ]
    );
}

#[tokio::test]
async fn test_edges_follow_source_line_order() {
    let input = files(&[
        ("a.js", "export const x = 1;"),
        ("b.js", "export const y = 2;"),
        (
            "c.js",
            "export { x } from './a.js';\nimport { y } from './b.js';\nimport { x as z } from './a.js';",
        ),
    ]);
    let graph = builder().build(&input).await;

    let edges: Vec<(&str, EdgeType, Vec<String>)> = graph
        .edges
        .iter()
        .map(|e| (e.to.as_str(), e.edge_type, e.specifiers.clone()))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("a.js", EdgeType::Reexport, vec!["x".to_string()]),
            ("b.js", EdgeType::Import, vec!["y".to_string()]),
        ]
    );
}

#[tokio::test]
async fn test_python_relative_imports_resolve() {
    let input = files(&[
        ("app/models.py", "class User:\n    pass\n"),
        ("app/views.py", "import os\nfrom .models import User\nfrom ..lib.text import slug\n"),
        ("lib/text.py", "def slug(s):\n    return s\n"),
    ]);
    let graph = builder().build(&input).await;

    let edges: Vec<(&str, &str)> = graph
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(
        edges,
        vec![("app/views.py", "app/models.py"), ("app/views.py", "lib/text.py")]
    );
    // Stored analysis keeps the module as written.
    assert_eq!(graph.nodes[1].imports[1].source, ".models");
}

#[tokio::test]
async fn test_counts_and_stats_agree_with_edges() {
    let input = files(&[
        ("src/util.js", "export function helper(a) { return a && a.x; }"),
        ("src/a.js", "import { helper } from './util';\nexport const a = helper(1);"),
        ("src/b.js", "import { helper } from './util.js';\nexport class B {}"),
        ("src/c.py", "def run():\n    pass\n"),
        ("README.md", "# readme"),
    ]);
    let graph = builder().build(&input).await;

    for node in &graph.nodes {
        let inbound = graph.edges.iter().filter(|e| e.to == node.id).count();
        let outbound = graph.edges.iter().filter(|e| e.from == node.id).count();
        assert_eq!(node.dependent_count, inbound, "{}", node.id);
        assert_eq!(node.dependency_count, outbound, "{}", node.id);
    }
    assert_eq!(graph.stats.total_edges, graph.edges.len());
    assert_eq!(graph.stats.total_files, graph.nodes.len());
    assert_eq!(graph.stats.max_dependents, 2);
    assert_eq!(
        graph.stats.languages,
        vec!["javascript".to_string(), "python".to_string()]
    );
    assert_eq!(graph.stats.total_classes, 1);
}

#[tokio::test]
async fn test_incremental_changes_patch_the_graph() {
    let input = files(&[
        ("a.js", "export const a = 1;"),
        ("b.js", "import { a } from './a.js';\nexport const b = a;"),
        ("c.js", "import { d } from './d.js';\nexport const c = d;"),
    ]);
    let mut builder = builder();
    let first = builder.build(&input).await;
    assert_eq!(first.edges.len(), 1);
    let untouched_c = first.nodes[2].clone();

    let changes = vec![
        FileChange::Remove("a.js".into()),
        FileChange::Upsert(SourceFile::new("d.js", "export const d = 4;")),
    ];
    let patched = builder.apply_changes(first.nodes, &changes).await;

    let ids: Vec<&str> = patched.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["b.js", "c.js", "d.js"]);
    assert_eq!(patched.edges.len(), 1);
    assert_eq!(patched.edges[0].from, "c.js");
    assert_eq!(patched.edges[0].to, "d.js");

    let c = &patched.nodes[1];
    assert_eq!(c.imports, untouched_c.imports);
    assert_eq!(c.dependency_count, 1);
    assert_eq!(patched.nodes[0].dependency_count, 0);
    assert_eq!(patched.stats.total_files, 3);
}

#[tokio::test]
async fn test_graph_round_trips_through_json() {
    let input = files(&[("a.js", "export const a = 1;"), ("b.js", "import './a.js';")]);
    let graph = stamp(builder().build(&input).await);

    let json = serde_json::to_value(&graph).unwrap();
    assert_eq!(json["projectId"], "p1");
    assert_eq!(json["nodes"][0]["fileName"], "a.js");
    assert_eq!(json["nodes"][0]["dependentCount"], 1);
    assert_eq!(json["edges"][0]["type"], "import");
    assert_eq!(json["stats"]["totalEdges"], 1);

    let back: ProjectGraph = serde_json::from_value(json).unwrap();
    assert_eq!(back, graph);
}
