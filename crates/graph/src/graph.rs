use crate::types::{GraphNode, ProjectGraph};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Adjacency view over a [`ProjectGraph`] for neighbourhood queries.
///
/// Node weights index into `graph.nodes`, edge weights into `graph.edges`;
/// results come back in node / edge-list order.
pub struct GraphIndex<'g> {
    graph: &'g ProjectGraph,
    inner: DiGraph<usize, usize>,
    by_id: HashMap<&'g str, NodeIndex>,
}

impl<'g> GraphIndex<'g> {
    #[must_use]
    pub fn new(graph: &'g ProjectGraph) -> Self {
        let mut inner = DiGraph::with_capacity(graph.nodes.len(), graph.edges.len());
        let mut by_id = HashMap::with_capacity(graph.nodes.len());

        for (position, node) in graph.nodes.iter().enumerate() {
            let idx = inner.add_node(position);
            by_id.insert(node.id.as_str(), idx);
        }
        for (position, edge) in graph.edges.iter().enumerate() {
            if let (Some(&from), Some(&to)) =
                (by_id.get(edge.from.as_str()), by_id.get(edge.to.as_str()))
            {
                inner.add_edge(from, to, position);
            }
        }

        Self {
            graph,
            inner,
            by_id,
        }
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&'g GraphNode> {
        self.by_id.get(id).map(|&idx| &self.graph.nodes[self.inner[idx]])
    }

    /// Files importing `id`
    #[must_use]
    pub fn dependents(&self, id: &str) -> Vec<&'g GraphNode> {
        self.neighbours(id, Direction::Incoming)
    }

    /// Files imported by `id`
    #[must_use]
    pub fn dependencies(&self, id: &str) -> Vec<&'g GraphNode> {
        self.neighbours(id, Direction::Outgoing)
    }

    fn neighbours(&self, id: &str, direction: Direction) -> Vec<&'g GraphNode> {
        let Some(&idx) = self.by_id.get(id) else {
            return Vec::new();
        };

        let mut hits: Vec<(usize, NodeIndex)> = self
            .inner
            .edges_directed(idx, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (*edge.weight(), other)
            })
            .collect();
        hits.sort_unstable_by_key(|(position, _)| *position);

        hits.into_iter()
            .map(|(_, other)| &self.graph.nodes[self.inner[other]])
            .collect()
    }

    /// In-degree plus out-degree
    #[must_use]
    pub fn coupling(&self, id: &str) -> usize {
        self.by_id.get(id).map_or(0, |&idx| {
            self.inner.edges_directed(idx, Direction::Incoming).count()
                + self.inner.edges_directed(idx, Direction::Outgoing).count()
        })
    }

    /// Up to `limit` nodes by descending coupling, ties in node order
    #[must_use]
    pub fn most_connected(&self, limit: usize) -> Vec<&'g GraphNode> {
        let mut ranked: Vec<(usize, &'g GraphNode)> = self
            .graph
            .nodes
            .iter()
            .map(|node| (self.coupling(&node.id), node))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.into_iter().take(limit).map(|(_, node)| node).collect()
    }

    /// Files reachable by following imports backwards up to `max_depth` hops,
    /// with their distance
    #[must_use]
    pub fn transitive_dependents(&self, id: &str, max_depth: usize) -> Vec<(&'g GraphNode, usize)> {
        let Some(&start) = self.by_id.get(id) else {
            return Vec::new();
        };

        let mut visited = HashSet::from([start]);
        let mut frontier = vec![start];
        let mut result = Vec::new();

        for depth in 1..=max_depth {
            let mut next = Vec::new();
            for current in frontier {
                for edge in self.inner.edges_directed(current, Direction::Incoming) {
                    let source = edge.source();
                    if visited.insert(source) {
                        next.push(source);
                        result.push((&self.graph.nodes[self.inner[source]], depth));
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeType, GraphEdge, GraphStats};
    use codemap_extractor::Language;
    use pretty_assertions::assert_eq;

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> ProjectGraph {
        ProjectGraph {
            project_id: "p".into(),
            persistent_project_id: None,
            user_id: "u".into(),
            project_name: "demo".into(),
            branch: "main".into(),
            nodes: ids
                .iter()
                .map(|id| GraphNode::empty(*id, Language::JavaScript))
                .collect(),
            edges: edges
                .iter()
                .map(|(from, to)| GraphEdge {
                    from: (*from).into(),
                    to: (*to).into(),
                    specifiers: Vec::new(),
                    edge_type: EdgeType::Import,
                })
                .collect(),
            stats: GraphStats::default(),
            analyzed_at: 0,
            expires_at: u64::MAX,
        }
    }

    fn ids<'a>(nodes: &[&'a GraphNode]) -> Vec<&'a str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn neighbours_follow_edge_order() {
        let g = graph(
            &["a.js", "b.js", "c.js", "d.js"],
            &[("b.js", "a.js"), ("c.js", "a.js"), ("a.js", "d.js"), ("d.js", "c.js")],
        );
        let index = GraphIndex::new(&g);
        assert_eq!(ids(&index.dependents("a.js")), vec!["b.js", "c.js"]);
        assert_eq!(ids(&index.dependencies("a.js")), vec!["d.js"]);
        assert!(index.dependents("missing.js").is_empty());
        assert!(index.node("missing.js").is_none());
    }

    #[test]
    fn most_connected_breaks_ties_by_node_order() {
        let g = graph(
            &["a.js", "b.js", "c.js"],
            &[("a.js", "b.js"), ("b.js", "c.js")],
        );
        let index = GraphIndex::new(&g);
        assert_eq!(ids(&index.most_connected(2)), vec!["b.js", "a.js"]);
    }

    #[test]
    fn transitive_dependents_report_distance() {
        let g = graph(
            &["core.js", "mid.js", "top.js", "other.js"],
            &[("mid.js", "core.js"), ("top.js", "mid.js"), ("other.js", "top.js")],
        );
        let index = GraphIndex::new(&g);
        let hits: Vec<(&str, usize)> = index
            .transitive_dependents("core.js", 2)
            .into_iter()
            .map(|(n, d)| (n.id.as_str(), d))
            .collect();
        assert_eq!(hits, vec![("mid.js", 1), ("top.js", 2)]);
    }
}
