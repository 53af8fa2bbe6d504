use std::collections::{HashMap, HashSet};

/// Rendering direction of the whole diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowDirection {
    #[default]
    TopDown,
    LeftRight,
}

/// The fixed set of node highlight classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStyle {
    Focus,
    Dependent,
    Dependency,
    Entry,
    Core,
    Leaf,
}

impl NodeStyle {
    pub const ALL: [Self; 6] = [
        Self::Focus,
        Self::Dependent,
        Self::Dependency,
        Self::Entry,
        Self::Core,
        Self::Leaf,
    ];

    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Dependent => "dependent",
            Self::Dependency => "dependency",
            Self::Entry => "entry",
            Self::Core => "core",
            Self::Leaf => "leaf",
        }
    }

    /// Fill colour shared by all renderers
    #[must_use]
    pub const fn fill(self) -> &'static str {
        match self {
            Self::Focus => "#f9a825",
            Self::Dependent => "#90caf9",
            Self::Dependency => "#a5d6a7",
            Self::Entry => "#ce93d8",
            Self::Core => "#ffab91",
            Self::Leaf => "#e0e0e0",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutNode {
    /// Alphanumeric, unique within the layout
    pub id: String,
    /// Original file path
    pub label: String,
    pub style: Option<NodeStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: String,
    pub label: String,
    pub nodes: Vec<LayoutNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEdge {
    pub from: String,
    pub to: String,
}

/// Syntax-neutral description of a diagram
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagramLayout {
    pub direction: FlowDirection,
    pub clusters: Vec<Cluster>,
    /// Nodes outside any cluster
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl DiagramLayout {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() + self.clusters.iter().map(|c| c.nodes.len()).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Styles used by at least one node, in declaration order
    #[must_use]
    pub fn styles_in_use(&self) -> Vec<NodeStyle> {
        let used: HashSet<NodeStyle> = self
            .nodes
            .iter()
            .chain(self.clusters.iter().flat_map(|c| c.nodes.iter()))
            .filter_map(|n| n.style)
            .collect();
        NodeStyle::ALL
            .into_iter()
            .filter(|s| used.contains(s))
            .collect()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &LayoutNode> {
        self.clusters
            .iter()
            .flat_map(|c| c.nodes.iter())
            .chain(self.nodes.iter())
    }
}

/// Keywords of the supported diagram syntaxes; never handed out as ids
const RESERVED_IDS: &[&str] = &[
    "end", "graph", "subgraph", "flowchart", "class", "classDef", "style", "click", "digraph",
    "node", "edge", "strict",
];

/// Hands out diagram-safe identifiers: non-alphanumerics stripped, empty
/// results replaced by `n<index>`, collisions suffixed with a counter.
#[derive(Debug)]
pub struct IdAllocator {
    used: HashSet<String>,
    assigned: HashMap<String, String>,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            used: RESERVED_IDS.iter().map(|id| (*id).to_string()).collect(),
            assigned: HashMap::new(),
        }
    }

    /// Stable id for `key`; repeated calls return the same id
    pub fn id_for(&mut self, key: &str) -> String {
        if let Some(id) = self.assigned.get(key) {
            return id.clone();
        }

        let mut base: String = key.chars().filter(char::is_ascii_alphanumeric).collect();
        if base.is_empty() {
            base = format!("n{}", self.assigned.len());
        }
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }

        self.used.insert(candidate.clone());
        self.assigned.insert(key.to_string(), candidate.clone());
        candidate
    }

    /// Id previously assigned to `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.assigned.get(key).map(String::as_str)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
