use super::layout::{Cluster, DiagramLayout, FlowDirection, IdAllocator, LayoutEdge, LayoutNode, NodeStyle};
use crate::graph::GraphIndex;
use crate::types::{GraphNode, ProjectGraph};
use std::collections::HashSet;

/// Per-bucket cap for the data-flow view
pub const DATA_FLOW_BUCKET_CAP: usize = 10;

const ROOT_CLUSTER: &str = "(root)";

/// Directory clusters, most-referenced files first, `max_nodes` overall
#[must_use]
pub fn architecture(graph: &ProjectGraph, max_nodes: usize) -> DiagramLayout {
    let mut ids = IdAllocator::new();

    let mut groups: Vec<(&str, Vec<&GraphNode>)> = Vec::new();
    for node in &graph.nodes {
        let dir = node.directory();
        match groups.iter_mut().find(|(name, _)| *name == dir) {
            Some((_, members)) => members.push(node),
            None => groups.push((dir, vec![node])),
        }
    }

    let mut included: HashSet<&str> = HashSet::new();
    let mut clusters = Vec::new();
    for (dir, mut members) in groups {
        if included.len() >= max_nodes {
            break;
        }
        members.sort_by_key(|n| std::cmp::Reverse(n.dependent_count + n.exports.len()));

        let label = if dir.is_empty() { ROOT_CLUSTER } else { dir };
        let cluster_id = ids.id_for(&format!("cluster:{label}"));
        let mut nodes = Vec::new();
        for node in members {
            if included.len() >= max_nodes {
                break;
            }
            included.insert(node.id.as_str());
            nodes.push(layout_node(&mut ids, node, None));
        }
        clusters.push(Cluster {
            id: cluster_id,
            label: label.to_string(),
            nodes,
        });
    }

    DiagramLayout {
        direction: FlowDirection::TopDown,
        edges: edges_between(graph, &included, &ids),
        clusters,
        nodes: Vec::new(),
    }
}

/// Global most-connected view, or the neighbourhood of `focus` when it names a node
#[must_use]
pub fn dependency(graph: &ProjectGraph, focus: Option<&str>, max_nodes: usize) -> DiagramLayout {
    let index = GraphIndex::new(graph);
    let mut ids = IdAllocator::new();
    let mut included: HashSet<&str> = HashSet::new();
    let mut nodes = Vec::new();

    match focus.and_then(|f| index.node(f)) {
        Some(center) => {
            let half = (max_nodes / 2).max(1);
            included.insert(center.id.as_str());
            nodes.push(layout_node(&mut ids, center, Some(NodeStyle::Focus)));

            for node in index.dependents(&center.id).into_iter().take(half) {
                if included.insert(node.id.as_str()) {
                    nodes.push(layout_node(&mut ids, node, Some(NodeStyle::Dependent)));
                }
            }
            for node in index.dependencies(&center.id).into_iter().take(half) {
                if included.insert(node.id.as_str()) {
                    nodes.push(layout_node(&mut ids, node, Some(NodeStyle::Dependency)));
                }
            }
        }
        None => {
            if let Some(missing) = focus {
                log::debug!("Focus file {missing} not in graph, using global view");
            }
            for node in index.most_connected(max_nodes) {
                included.insert(node.id.as_str());
                nodes.push(layout_node(&mut ids, node, None));
            }
        }
    }

    DiagramLayout {
        direction: FlowDirection::TopDown,
        edges: edges_between(graph, &included, &ids),
        clusters: Vec::new(),
        nodes,
    }
}

/// Entry points, core modules and utilities, each capped
#[must_use]
pub fn data_flow(graph: &ProjectGraph) -> DiagramLayout {
    let buckets: [(&str, NodeStyle, fn(&GraphNode) -> bool); 3] = [
        ("Entry Points", NodeStyle::Entry, |n| {
            n.dependent_count == 0 && n.dependency_count >= 1
        }),
        ("Core Modules", NodeStyle::Core, |n| {
            n.dependent_count > 2 && n.dependency_count >= 1
        }),
        ("Utilities", NodeStyle::Leaf, |n| {
            n.dependent_count >= 1 && n.dependency_count == 0
        }),
    ];

    let mut ids = IdAllocator::new();
    let mut included: HashSet<&str> = HashSet::new();
    let mut clusters = Vec::new();

    for (label, style, belongs) in buckets {
        let cluster_id = ids.id_for(&format!("cluster:{label}"));
        let nodes: Vec<LayoutNode> = graph
            .nodes
            .iter()
            .filter(|n| belongs(n))
            .take(DATA_FLOW_BUCKET_CAP)
            .map(|n| {
                included.insert(n.id.as_str());
                layout_node(&mut ids, n, Some(style))
            })
            .collect();
        if !nodes.is_empty() {
            clusters.push(Cluster {
                id: cluster_id,
                label: label.to_string(),
                nodes,
            });
        }
    }

    DiagramLayout {
        direction: FlowDirection::LeftRight,
        edges: edges_between(graph, &included, &ids),
        clusters,
        nodes: Vec::new(),
    }
}

fn layout_node(ids: &mut IdAllocator, node: &GraphNode, style: Option<NodeStyle>) -> LayoutNode {
    LayoutNode {
        id: ids.id_for(&node.id),
        label: node.id.clone(),
        style,
    }
}

fn edges_between(graph: &ProjectGraph, included: &HashSet<&str>, ids: &IdAllocator) -> Vec<LayoutEdge> {
    graph
        .edges
        .iter()
        .filter_map(|edge| {
            if !included.contains(edge.from.as_str()) || !included.contains(edge.to.as_str()) {
                return None;
            }
            Some(LayoutEdge {
                from: ids.get(&edge.from)?.to_string(),
                to: ids.get(&edge.to)?.to_string(),
            })
        })
        .collect()
}
