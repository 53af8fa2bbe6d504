use codemap_extractor::{
    ClassInfo, CodeMetrics, ComplexityLevel, ExportInfo, FileAnalysis, FunctionInfo, ImportInfo,
    Language,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One analyzed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Project-root-relative path with `/` separators
    pub id: String,
    pub file_name: String,
    pub language: Language,
    pub exports: Vec<ExportInfo>,
    pub imports: Vec<ImportInfo>,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    /// Cyclomatic complexity of the whole file
    pub complexity: u32,
    pub complexity_level: ComplexityLevel,
    pub metrics: CodeMetrics,
    /// Resolved inbound edges
    pub dependent_count: usize,
    /// Resolved outbound edges
    pub dependency_count: usize,
}

impl GraphNode {
    #[must_use]
    pub fn from_analysis(id: impl Into<String>, language: Language, analysis: FileAnalysis) -> Self {
        let id = id.into();
        Self {
            file_name: file_name_of(&id).to_string(),
            id,
            language,
            exports: analysis.exports,
            imports: analysis.imports,
            functions: analysis.functions,
            classes: analysis.classes,
            complexity: analysis.cyclomatic_complexity,
            complexity_level: analysis.complexity,
            metrics: analysis.metrics,
            dependent_count: 0,
            dependency_count: 0,
        }
    }

    /// Minimal node for a file whose extraction failed outright
    #[must_use]
    pub fn empty(id: impl Into<String>, language: Language) -> Self {
        let id = id.into();
        Self {
            file_name: file_name_of(&id).to_string(),
            id,
            language,
            exports: Vec::new(),
            imports: Vec::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            complexity: 1,
            complexity_level: ComplexityLevel::Simple,
            metrics: CodeMetrics::default(),
            dependent_count: 0,
            dependency_count: 0,
        }
    }

    /// Directory part of the id, `""` for root-level files
    #[must_use]
    pub fn directory(&self) -> &str {
        self.id.rsplit_once('/').map_or("", |(dir, _)| dir)
    }
}

fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Import,
    Reexport,
    Dynamic,
}

/// Resolved import relationship; at most one per ordered `(from, to)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub specifiers: Vec<String>,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub total_files: usize,
    pub total_functions: usize,
    pub total_classes: usize,
    pub total_exports: usize,
    pub total_edges: usize,
    /// Mean file complexity, two decimals
    pub average_complexity: f64,
    pub max_dependents: usize,
    /// Sorted, without `unknown`
    pub languages: Vec<String>,
    pub chunk_count: usize,
    pub processing_time_ms: u64,
}

/// Nodes, edges and stats produced by one build, before it is stamped and stored
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
    /// Cooperative yields taken between chunks
    pub yield_points: usize,
}

/// Who a graph belongs to and how it is addressed in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphIdentity {
    pub project_id: String,
    pub persistent_project_id: Option<String>,
    pub user_id: String,
    pub project_name: String,
    pub branch: String,
}

/// A committed analysis of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGraph {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_project_id: Option<String>,
    pub user_id: String,
    pub project_name: String,
    pub branch: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
    /// Unix milliseconds
    pub analyzed_at: u64,
    /// Unix milliseconds
    pub expires_at: u64,
}

impl ProjectGraph {
    /// Stamp an assembled graph with its identity and TTL window
    #[must_use]
    pub fn stamp(
        identity: GraphIdentity,
        assembled: AssembledGraph,
        analyzed_at: u64,
        ttl: Duration,
    ) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            project_id: identity.project_id,
            persistent_project_id: identity.persistent_project_id,
            user_id: identity.user_id,
            project_name: identity.project_name,
            branch: identity.branch,
            nodes: assembled.nodes,
            edges: assembled.edges,
            stats: assembled.stats,
            analyzed_at,
            expires_at: analyzed_at.saturating_add(ttl_ms),
        }
    }

    #[must_use]
    pub fn identity(&self) -> GraphIdentity {
        GraphIdentity {
            project_id: self.project_id.clone(),
            persistent_project_id: self.persistent_project_id.clone(),
            user_id: self.user_id.clone(),
            project_name: self.project_name.clone(),
            branch: self.branch.clone(),
        }
    }

    #[must_use]
    pub const fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at <= now_ms
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now_ms())
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Current wall-clock time in Unix milliseconds
#[must_use]
pub fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
