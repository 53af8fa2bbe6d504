use super::layout::{DiagramLayout, FlowDirection, LayoutNode};
use super::DiagramRenderer;
use std::fmt::Write;

/// Graphviz DOT syntax (`digraph`, `->`)
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

impl DiagramRenderer for DotRenderer {
    fn render(&self, layout: &DiagramLayout) -> String {
        let rankdir = match layout.direction {
            FlowDirection::TopDown => "TB",
            FlowDirection::LeftRight => "LR",
        };
        let mut out = String::from("digraph codemap {\n");
        let _ = writeln!(out, "  rankdir={rankdir};");
        out.push_str("  node [shape=box, fontname=\"Helvetica\"];\n");

        if layout.is_empty() {
            out.push_str("  empty [label=\"No files analyzed\"];\n}\n");
            return out;
        }

        for cluster in &layout.clusters {
            let _ = writeln!(out, "  subgraph cluster_{} {{", cluster.id);
            let _ = writeln!(out, "    label=\"{}\";", escape(&cluster.label));
            for node in &cluster.nodes {
                write_node(&mut out, node, "    ");
            }
            out.push_str("  }\n");
        }
        for node in &layout.nodes {
            write_node(&mut out, node, "  ");
        }
        for edge in &layout.edges {
            let _ = writeln!(out, "  \"{}\" -> \"{}\";", edge.from, edge.to);
        }

        out.push_str("}\n");
        out
    }
}

fn write_node(out: &mut String, node: &LayoutNode, indent: &str) {
    match node.style {
        Some(style) => {
            let _ = writeln!(
                out,
                "{indent}\"{}\" [label=\"{}\", style=filled, fillcolor=\"{}\"];",
                node.id,
                escape(&node.label),
                style.fill()
            );
        }
        None => {
            let _ = writeln!(out, "{indent}\"{}\" [label=\"{}\"];", node.id, escape(&node.label));
        }
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
