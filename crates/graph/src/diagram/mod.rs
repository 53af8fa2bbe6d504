//! Bounded, text-based diagrams of a project graph.
//!
//! Views ([`views`]) reduce a graph to a [`DiagramLayout`]; a
//! [`DiagramRenderer`] turns the layout into one concrete syntax.

mod dot;
mod layout;
mod mermaid;
pub mod views;

pub use dot::DotRenderer;
pub use layout::{
    Cluster, DiagramLayout, FlowDirection, IdAllocator, LayoutEdge, LayoutNode, NodeStyle,
};
pub use mermaid::MermaidRenderer;

use crate::error::GraphError;
use crate::types::ProjectGraph;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_MAX_NODES: usize = 30;

/// Turns a neutral layout into diagram source text
pub trait DiagramRenderer {
    fn render(&self, layout: &DiagramLayout) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagramKind {
    #[default]
    Architecture,
    Dependency,
    DataFlow,
}

impl FromStr for DiagramKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "architecture" | "arch" => Ok(Self::Architecture),
            "dependency" | "dependencies" | "deps" => Ok(Self::Dependency),
            "data-flow" | "dataflow" | "data_flow" | "flow" => Ok(Self::DataFlow),
            other => Err(GraphError::InvalidOption(format!("unknown diagram type `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramFormat {
    #[default]
    Mermaid,
    Dot,
}

impl DiagramFormat {
    #[must_use]
    pub fn renderer(self) -> Box<dyn DiagramRenderer + Send + Sync> {
        match self {
            Self::Mermaid => Box::new(MermaidRenderer),
            Self::Dot => Box::new(DotRenderer),
        }
    }
}

impl FromStr for DiagramFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(GraphError::InvalidOption(format!("unknown diagram format `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramOptions {
    pub kind: DiagramKind,
    pub focus_file: Option<String>,
    pub max_nodes: usize,
    pub format: DiagramFormat,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            kind: DiagramKind::default(),
            focus_file: None,
            max_nodes: DEFAULT_MAX_NODES,
            format: DiagramFormat::default(),
        }
    }
}

/// Build the requested view of `graph`
#[must_use]
pub fn layout_for(graph: &ProjectGraph, options: &DiagramOptions) -> DiagramLayout {
    let max_nodes = options.max_nodes.max(1);
    match options.kind {
        DiagramKind::Architecture => views::architecture(graph, max_nodes),
        DiagramKind::Dependency => {
            views::dependency(graph, options.focus_file.as_deref(), max_nodes)
        }
        DiagramKind::DataFlow => views::data_flow(graph),
    }
}

/// Build and render the requested view of `graph`. Never fails; an empty
/// graph renders a placeholder diagram.
#[must_use]
pub fn generate_diagram(graph: &ProjectGraph, options: &DiagramOptions) -> String {
    let layout = layout_for(graph, options);
    options.format.renderer().render(&layout)
}
