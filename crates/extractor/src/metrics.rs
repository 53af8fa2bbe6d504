//! Complexity metrics shared by the AST and heuristic extractors.

use crate::language::{CommentStyle, Language};
use crate::types::{CodeMetrics, ComplexityLevel};
use tree_sitter::Node;

const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
    "method_definition",
];

const CONTROL_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "switch_statement",
    "try_statement",
];

pub(crate) fn is_function_kind(kind: &str) -> bool {
    FUNCTION_KINDS.contains(&kind)
}

/// Cyclomatic complexity of the subtree rooted at `root`.
///
/// Starts at 1 and adds one per decision point: `if`, ternary, every loop
/// form, `catch`, non-default `switch` cases and `&&` / `||` expressions.
#[must_use]
pub fn cyclomatic_complexity(root: Node, source: &[u8]) -> u32 {
    let mut complexity = 1u32;
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match node.kind() {
            "if_statement" | "ternary_expression" | "for_statement" | "for_in_statement"
            | "while_statement" | "do_statement" | "catch_clause" | "switch_case" => {
                complexity += 1;
            }
            "binary_expression" => {
                let is_logical = node
                    .child_by_field_name("operator")
                    .and_then(|op| op.utf8_text(source).ok())
                    .is_some_and(|op| op == "&&" || op == "||");
                if is_logical {
                    complexity += 1;
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            stack.push(child);
        }
    }

    complexity
}

/// Deepest nesting of functions, blocks and control structures
#[must_use]
pub fn max_nesting_depth(root: Node) -> usize {
    let mut max_depth = 0;
    let mut stack = vec![(root, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        let kind = node.kind();
        let depth = if is_function_kind(kind)
            || kind == "statement_block"
            || CONTROL_KINDS.contains(&kind)
        {
            depth + 1
        } else {
            depth
        };
        max_depth = max_depth.max(depth);

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            stack.push((child, depth));
        }
    }

    max_depth
}

/// Count non-blank lines that carry code (comment-only lines are skipped)
#[must_use]
pub fn lines_of_code(source: &str, language: Language) -> usize {
    let style = language.comment_style();
    let mut in_block = false;
    let mut count = 0;

    for line in source.lines() {
        let mut rest = line.trim();
        if rest.is_empty() {
            continue;
        }

        match style {
            CommentStyle::CFamily => {
                let mut has_code = false;
                loop {
                    if in_block {
                        match rest.find("*/") {
                            Some(end) => {
                                in_block = false;
                                rest = rest[end + 2..].trim_start();
                            }
                            None => break,
                        }
                    }
                    if rest.is_empty() || rest.starts_with("//") {
                        break;
                    }
                    if let Some(body) = rest.strip_prefix("/*") {
                        in_block = true;
                        rest = body;
                        continue;
                    }
                    has_code = true;
                    // A block opened after code on the same line still counts as code.
                    if let Some(start) = rest.find("/*") {
                        let tail = &rest[start + 2..];
                        if !tail.contains("*/") {
                            in_block = true;
                        }
                    }
                    break;
                }
                if has_code {
                    count += 1;
                }
            }
            CommentStyle::Hash => {
                if !rest.starts_with('#') {
                    count += 1;
                }
            }
            CommentStyle::None => count += 1,
        }
    }

    count
}

/// `clamp(171 - 5.2 ln(10 LOC) - 0.23 CC - 16.2 ln(LOC), 0, 100)`, two decimals
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn maintainability_index(lines_of_code: usize, cyclomatic: u32) -> f64 {
    if lines_of_code == 0 {
        return 100.0;
    }
    let loc = lines_of_code as f64;
    let raw = 171.0 - 5.2 * (10.0 * loc).ln() - 0.23 * f64::from(cyclomatic) - 16.2 * loc.ln();
    round2(raw.clamp(0.0, 100.0))
}

/// Weighted structural score bucketed into simple / medium / complex
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn complexity_level(
    functions: usize,
    classes: usize,
    exports: usize,
    imports: usize,
    cyclomatic: u32,
) -> ComplexityLevel {
    let score = 2.0 * functions as f64
        + 3.0 * classes as f64
        + exports as f64
        + 0.5 * imports as f64
        + 0.5 * f64::from(cyclomatic);

    if score < 10.0 {
        ComplexityLevel::Simple
    } else if score < 30.0 {
        ComplexityLevel::Medium
    } else {
        ComplexityLevel::Complex
    }
}

pub(crate) fn build_metrics(
    source: &str,
    language: Language,
    cyclomatic: u32,
    max_nesting_depth: usize,
    function_count: usize,
    class_count: usize,
) -> CodeMetrics {
    let loc = lines_of_code(source, language);
    CodeMetrics {
        total_lines: source.lines().count(),
        lines_of_code: loc,
        max_nesting_depth,
        maintainability_index: maintainability_index(loc, cyclomatic),
        function_count,
        class_count,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
