//! Tree-sitter based extraction for JavaScript and TypeScript sources.

mod context;
mod visitor;

pub use context::{NamingContext, ANONYMOUS};

use crate::error::{ExtractorError, Result};
use crate::language::Language;
use crate::metrics::{build_metrics, complexity_level, cyclomatic_complexity, max_nesting_depth};
use crate::types::{AnalysisSource, FileAnalysis};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tree_sitter::{Node, Parser};
use visitor::Visitor;

/// Longest snippet of an ERROR node quoted in a syntax error message
const ERROR_SNIPPET_CHARS: usize = 24;

/// Grammar-backed extractor; keeps one parser per language
pub struct AstExtractor {
    parsers: HashMap<Language, Parser>,
}

impl AstExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    fn parser_for(&mut self, language: Language) -> Result<&mut Parser> {
        match self.parsers.entry(language) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let grammar = language.tree_sitter_language()?;
                let mut parser = Parser::new();
                parser
                    .set_language(&grammar)
                    .map_err(|e| ExtractorError::Grammar(e.to_string()))?;
                Ok(entry.insert(parser))
            }
        }
    }

    /// Parse `source` and collect structure and metrics.
    ///
    /// Fails with [`ExtractorError::Syntax`] when the tree contains error or
    /// missing nodes; callers fall back to the heuristic extractor.
    pub fn extract(&mut self, source: &str, language: Language) -> Result<FileAnalysis> {
        if !language.supports_ast() {
            return Err(ExtractorError::unsupported_language(language.as_str()));
        }

        let parser = self.parser_for(language)?;
        let tree = parser.parse(source, None).ok_or(ExtractorError::NoTree)?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(first_syntax_error(root, source.as_bytes()));
        }

        let mut visitor = Visitor::new(source);
        visitor.visit(root, &NamingContext::None);

        let cyclomatic = cyclomatic_complexity(root, source.as_bytes());
        let complexity = complexity_level(
            visitor.functions.len(),
            visitor.classes.len(),
            visitor.exports.len(),
            visitor.imports.len(),
            cyclomatic,
        );
        let metrics = build_metrics(
            source,
            language,
            cyclomatic,
            max_nesting_depth(root),
            visitor.functions.len(),
            visitor.classes.len(),
        );

        Ok(FileAnalysis {
            functions: visitor.functions,
            classes: visitor.classes,
            exports: visitor.exports,
            imports: visitor.imports,
            variables: visitor.variables,
            cyclomatic_complexity: cyclomatic,
            complexity,
            metrics,
            source: AnalysisSource::Ast,
        })
    }
}

impl Default for AstExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the first ERROR or MISSING node in document order
fn first_syntax_error(root: Node, source: &[u8]) -> ExtractorError {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() || node.is_error() {
            let position = node.start_position();
            let message = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                let text = node.utf8_text(source).unwrap_or_default();
                let snippet: String = text.chars().take(ERROR_SNIPPET_CHARS).collect();
                format!("unexpected `{}`", snippet.trim())
            };
            return ExtractorError::Syntax {
                line: position.row + 1,
                column: position.column + 1,
                message,
            };
        }

        if node.has_error() {
            // Reverse so the leftmost child is examined first.
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    let position = root.start_position();
    ExtractorError::Syntax {
        line: position.row + 1,
        column: position.column + 1,
        message: "unparseable input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExportKind, MethodKind};
    use pretty_assertions::assert_eq;

    fn extract(code: &str) -> FileAnalysis {
        AstExtractor::new()
            .extract(code, Language::JavaScript)
            .expect("valid javascript")
    }

    #[test]
    fn anonymous_functions_take_their_position_name() {
        let analysis = extract(
            r"
            const handler = () => {};
            const api = { fetch: async function () {}, save() {} };
            module.exports.run = function* () {};
            [1, 2].map((x) => x * 2);
            ",
        );
        let names: Vec<&str> = analysis.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["handler", "fetch", "save", "run", "anonymous"]);
        assert!(analysis.functions[1].is_async);
        assert!(analysis.functions[3].is_generator);
    }

    #[test]
    fn class_members_are_tagged() {
        let analysis = extract(
            r"
            class Store extends Base {
                #items = [];
                static create() {}
                constructor(a) { super(); }
                get size() { return 0; }
                set size(v) {}
                [Symbol.iterator]() {}
                onClick = () => {};
            }
            ",
        );
        let class = &analysis.classes[0];
        assert_eq!(class.name, "Store");
        assert_eq!(class.superclass.as_deref(), Some("Base"));

        let kinds: Vec<(&str, MethodKind)> = class
            .methods
            .iter()
            .map(|m| (m.name.as_str(), m.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("items", MethodKind::Field),
                ("create", MethodKind::Method),
                ("constructor", MethodKind::Constructor),
                ("size", MethodKind::Get),
                ("size", MethodKind::Set),
                ("[Symbol.iterator]", MethodKind::Method),
                ("onClick", MethodKind::Field),
            ]
        );
        assert!(class.methods[0].is_private);
        assert!(class.methods[1].is_static);
        assert!(class.methods[5].computed);
        // The arrow field initializer is named by its field.
        assert_eq!(analysis.functions[0].name, "onClick");
    }

    #[test]
    fn export_forms_are_classified() {
        let analysis = extract(
            r"
            export const a = 1, { b, c: d } = obj;
            export default function main() {}
            export { x as y };
            export * from './all';
            export * as ns from './ns';
            export { z } from './z';
            ",
        );
        let exports: Vec<(&str, ExportKind, Option<&str>)> = analysis
            .exports
            .iter()
            .map(|e| (e.name.as_str(), e.kind, e.source.as_deref()))
            .collect();
        assert_eq!(
            exports,
            vec![
                ("a", ExportKind::Variable, None),
                ("b", ExportKind::Variable, None),
                ("d", ExportKind::Variable, None),
                ("main", ExportKind::Default, None),
                ("y", ExportKind::Named, None),
                ("*", ExportKind::Reexport, Some("./all")),
                ("ns", ExportKind::Namespace, Some("./ns")),
                ("z", ExportKind::Reexport, Some("./z")),
            ]
        );
    }

    #[test]
    fn syntax_errors_report_position() {
        let err = AstExtractor::new()
            .extract("const ok = 1;\nfunction (\n", Language::JavaScript)
            .unwrap_err();
        let (line, column) = err.position().expect("syntax error position");
        assert!(line >= 2, "error reported on line {line}");
        assert!(column >= 1);
    }

    #[test]
    fn non_grammar_languages_are_rejected() {
        let err = AstExtractor::new()
            .extract("def f(): pass", Language::Python)
            .unwrap_err();
        assert!(matches!(err, ExtractorError::UnsupportedLanguage(_)));
    }
}
