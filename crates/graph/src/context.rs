use crate::graph::GraphIndex;
use crate::types::{GraphNode, ProjectGraph};
use codemap_extractor::{ExportKind, FunctionInfo};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Caps on how much of a file's neighbourhood goes into its summary
#[derive(Debug, Clone, Copy)]
pub struct ContextConfig {
    pub max_neighbors: usize,
    pub max_symbols: usize,
    /// Hops followed when counting indirect dependents
    pub impact_depth: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_neighbors: 10,
            max_symbols: 8,
            impact_depth: 3,
        }
    }
}

/// A file with its direct neighbourhood and a prompt-ready summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContext {
    pub node: GraphNode,
    /// Files importing this one, in edge order
    pub dependents: Vec<String>,
    /// Files this one imports, in edge order
    pub dependencies: Vec<String>,
    /// Files reaching this one through imports within `impact_depth` hops
    pub impacted_files: usize,
    pub summary: String,
}

/// Assemble the context for `file_path`, or `None` if the graph lacks it
#[must_use]
pub fn assemble_file_context(
    graph: &ProjectGraph,
    file_path: &str,
    config: ContextConfig,
) -> Option<FileContext> {
    let index = GraphIndex::new(graph);
    let node = index.node(file_path)?;

    let dependents: Vec<String> = index
        .dependents(file_path)
        .into_iter()
        .map(|n| n.id.clone())
        .collect();
    let dependencies: Vec<String> = index
        .dependencies(file_path)
        .into_iter()
        .map(|n| n.id.clone())
        .collect();

    let impacted_files = index
        .transitive_dependents(file_path, config.impact_depth)
        .len();

    let mut summary = render_summary(node, &dependents, &dependencies, config);
    if impacted_files > dependents.len() {
        let _ = writeln!(
            summary,
            "Changes reach {impacted_files} files within {} hops",
            config.impact_depth
        );
    }
    Some(FileContext {
        node: node.clone(),
        dependents,
        dependencies,
        impacted_files,
        summary,
    })
}

fn render_summary(
    node: &GraphNode,
    dependents: &[String],
    dependencies: &[String],
    config: ContextConfig,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "File: {} ({}, complexity {}, {})",
        node.id,
        node.language,
        node.complexity,
        node.complexity_level.as_str()
    );

    if node.exports.is_empty() {
        out.push_str("Exports: none\n");
    } else {
        let exports: Vec<String> = node
            .exports
            .iter()
            .take(config.max_symbols)
            .map(|e| format!("{} ({})", e.name, export_kind_label(e.kind)))
            .collect();
        let _ = writeln!(
            out,
            "Exports: {}{}",
            exports.join(", "),
            more_suffix(node.exports.len(), config.max_symbols)
        );
    }

    write_neighbours(&mut out, "Used by", dependents, config.max_neighbors);
    write_neighbours(&mut out, "Depends on", dependencies, config.max_neighbors);

    if !node.functions.is_empty() {
        let functions: Vec<String> = node
            .functions
            .iter()
            .take(config.max_symbols)
            .map(signature)
            .collect();
        let _ = writeln!(
            out,
            "Key functions: {}{}",
            functions.join(", "),
            more_suffix(node.functions.len(), config.max_symbols)
        );
    }

    if !node.classes.is_empty() {
        let classes: Vec<String> = node
            .classes
            .iter()
            .take(config.max_symbols)
            .map(|c| match &c.superclass {
                Some(base) => format!("{} extends {base} ({} members)", c.name, c.methods.len()),
                None => format!("{} ({} members)", c.name, c.methods.len()),
            })
            .collect();
        let _ = writeln!(out, "Classes: {}", classes.join(", "));
    }

    out
}

fn write_neighbours(out: &mut String, verb: &str, paths: &[String], cap: usize) {
    let noun = if paths.len() == 1 { "file" } else { "files" };
    if paths.is_empty() {
        let _ = writeln!(out, "{verb} 0 files");
        return;
    }
    let shown: Vec<&str> = paths.iter().take(cap).map(String::as_str).collect();
    let _ = writeln!(
        out,
        "{verb} {} {noun}: {}{}",
        paths.len(),
        shown.join(", "),
        more_suffix(paths.len(), cap)
    );
}

fn signature(function: &FunctionInfo) -> String {
    let prefix = if function.is_async { "async " } else { "" };
    let star = if function.is_generator { "*" } else { "" };
    format!("{prefix}{star}{}({})", function.name, function.params.join(", "))
}

fn more_suffix(total: usize, cap: usize) -> String {
    if total > cap {
        format!(" (+{} more)", total - cap)
    } else {
        String::new()
    }
}

const fn export_kind_label(kind: ExportKind) -> &'static str {
    match kind {
        ExportKind::Function => "function",
        ExportKind::Class => "class",
        ExportKind::Variable => "variable",
        ExportKind::Type => "type",
        ExportKind::Named => "named",
        ExportKind::Default => "default",
        ExportKind::Namespace => "namespace",
        ExportKind::Reexport => "re-export",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeType, GraphEdge, GraphStats};
    use codemap_extractor::{ExportInfo, Language};

    fn edge(from: &str, to: &str) -> GraphEdge {
        GraphEdge {
            from: from.into(),
            to: to.into(),
            specifiers: Vec::new(),
            edge_type: EdgeType::Import,
        }
    }

    fn sample() -> ProjectGraph {
        let mut util = GraphNode::empty("src/util.js", Language::JavaScript);
        util.exports.push(ExportInfo::new("helper", ExportKind::Function, 1));
        util.functions.push(FunctionInfo {
            name: "helper".into(),
            params: vec!["a".into(), "b".into()],
            is_async: true,
            is_generator: false,
            line: 1,
            complexity: 1,
        });
        ProjectGraph {
            project_id: "p".into(),
            persistent_project_id: None,
            user_id: "u".into(),
            project_name: "demo".into(),
            branch: "main".into(),
            nodes: vec![
                GraphNode::empty("src/app.js", Language::JavaScript),
                util,
                GraphNode::empty("src/cli.js", Language::JavaScript),
                GraphNode::empty("src/config.js", Language::JavaScript),
            ],
            edges: vec![
                edge("src/app.js", "src/util.js"),
                edge("src/cli.js", "src/util.js"),
                edge("src/util.js", "src/config.js"),
            ],
            stats: GraphStats::default(),
            analyzed_at: 0,
            expires_at: u64::MAX,
        }
    }

    #[test]
    fn context_lists_direct_neighbours() {
        let graph = sample();
        let context = assemble_file_context(&graph, "src/util.js", ContextConfig::default())
            .expect("node exists");

        assert_eq!(context.dependents, vec!["src/app.js", "src/cli.js"]);
        assert_eq!(context.dependencies, vec!["src/config.js"]);
        assert!(context.summary.contains("Exports: helper (function)"));
        assert!(context.summary.contains("Used by 2 files: src/app.js, src/cli.js"));
        assert!(context.summary.contains("Depends on 1 file: src/config.js"));
        assert!(context.summary.contains("Key functions: async helper(a, b)"));
        assert_eq!(context.impacted_files, 2);
        assert!(!context.summary.contains("Changes reach"));
    }

    #[test]
    fn indirect_dependents_are_counted() {
        let graph = sample();
        let context = assemble_file_context(&graph, "src/config.js", ContextConfig::default())
            .expect("node exists");
        assert_eq!(context.dependents, vec!["src/util.js"]);
        assert_eq!(context.impacted_files, 3);
        assert!(context.summary.contains("Changes reach 3 files within 3 hops"));
    }

    #[test]
    fn neighbour_lists_respect_cap() {
        let graph = sample();
        let config = ContextConfig {
            max_neighbors: 1,
            ..ContextConfig::default()
        };
        let context = assemble_file_context(&graph, "src/util.js", config).expect("node exists");
        assert!(context.summary.contains("Used by 2 files: src/app.js (+1 more)"));
        assert_eq!(context.dependents.len(), 2);
    }

    #[test]
    fn unknown_file_has_no_context() {
        assert!(assemble_file_context(&sample(), "missing.js", ContextConfig::default()).is_none());
    }
}
