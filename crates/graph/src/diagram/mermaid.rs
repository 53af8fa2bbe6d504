use super::layout::{DiagramLayout, FlowDirection, LayoutNode};
use super::DiagramRenderer;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Mermaid flowchart syntax (`graph TD`, `-->`)
#[derive(Debug, Clone, Copy, Default)]
pub struct MermaidRenderer;

impl DiagramRenderer for MermaidRenderer {
    fn render(&self, layout: &DiagramLayout) -> String {
        let direction = match layout.direction {
            FlowDirection::TopDown => "TD",
            FlowDirection::LeftRight => "LR",
        };
        let mut out = format!("graph {direction}\n");

        if layout.is_empty() {
            out.push_str(INDENT);
            out.push_str("empty[\"No files analyzed\"]\n");
            return out;
        }

        for cluster in &layout.clusters {
            let _ = writeln!(out, "{INDENT}subgraph {}[\"{}\"]", cluster.id, escape(&cluster.label));
            for node in &cluster.nodes {
                write_node(&mut out, node, 2);
            }
            let _ = writeln!(out, "{INDENT}end");
        }
        for node in &layout.nodes {
            write_node(&mut out, node, 1);
        }
        for edge in &layout.edges {
            let _ = writeln!(out, "{INDENT}{} --> {}", edge.from, edge.to);
        }

        for style in layout.styles_in_use() {
            let _ = writeln!(
                out,
                "{INDENT}classDef {} fill:{},stroke:#333,stroke-width:1px",
                style.class_name(),
                style.fill()
            );
            let members: Vec<&str> = layout
                .all_nodes()
                .filter(|n| n.style == Some(style))
                .map(|n| n.id.as_str())
                .collect();
            let _ = writeln!(out, "{INDENT}class {} {}", members.join(","), style.class_name());
        }

        out
    }
}

fn write_node(out: &mut String, node: &LayoutNode, depth: usize) {
    let _ = writeln!(
        out,
        "{}{}[\"{}\"]",
        INDENT.repeat(depth),
        node.id,
        escape(&node.label)
    );
}

fn escape(label: &str) -> String {
    label.replace('"', "#quot;")
}
