//! # Codemap Extractor
//!
//! Per-file structural extraction for the codemap dependency graph.
//!
//! ## Pipeline
//!
//! ```text
//! (source, language)
//!     │
//!     ├──> AST extractor (tree-sitter: JS / TS / TSX)
//!     │      └─> functions, classes, exports, imports, variables, metrics
//!     │
//!     └──> on parse failure or other languages
//!            └─> Heuristic extractor (regex, never fails)
//! ```
//!
//! ## Example
//!
//! ```
//! use codemap_extractor::parse_code;
//!
//! let analysis = parse_code("export function foo() { return 1; }", "javascript");
//! assert_eq!(analysis.functions[0].name, "foo");
//! assert_eq!(analysis.cyclomatic_complexity, 1);
//! ```

mod ast;
mod diagnostics;
mod error;
mod heuristic;
mod language;
mod metrics;
mod types;

pub use ast::{AstExtractor, NamingContext, ANONYMOUS};
pub use diagnostics::source_context;
pub use error::{ExtractorError, Result};
pub use language::{CommentStyle, Language, SyntaxFamily};
pub use metrics::{
    complexity_level, cyclomatic_complexity, lines_of_code, maintainability_index,
    max_nesting_depth,
};
pub use types::{
    AnalysisSource, ClassInfo, CodeMetrics, ComplexityLevel, DeclarationKind, ExportInfo,
    ExportKind, FileAnalysis, FunctionInfo, ImportInfo, ImportKind, ImportSpecifier, MethodInfo,
    MethodKind, SpecifierKind, VariableInfo,
};

/// AST-first extractor with heuristic fallback.
///
/// Holds the per-language parsers, so reuse one instance across files.
#[derive(Default)]
pub struct Extractor {
    ast: AstExtractor,
}

impl Extractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract(&mut self, source: &str, language: Language) -> FileAnalysis {
        self.extract_file(None, source, language)
    }

    /// Like [`Extractor::extract`], naming `path` in parse-failure logs
    pub fn extract_file(
        &mut self,
        path: Option<&str>,
        source: &str,
        language: Language,
    ) -> FileAnalysis {
        if language.supports_ast() {
            match self.ast.extract(source, language) {
                Ok(analysis) => return analysis,
                Err(err) => log_parse_failure(path, source, &err),
            }
        }
        heuristic::extract(source, language)
    }
}

fn log_parse_failure(path: Option<&str>, source: &str, err: &ExtractorError) {
    let file = path.unwrap_or("<input>");
    match err.position() {
        Some((line, column)) => log::warn!(
            "AST parse failed for {file} at {line}:{column}, using heuristic extraction: {err}\n{}",
            source_context(source, line, column)
        ),
        None => log::warn!("AST parse failed for {file}, using heuristic extraction: {err}"),
    }
}

/// Analyze one source string tagged with a language name (`"javascript"`,
/// `"ts"`, `"python"`, ...). Unknown tags use the heuristic extractor.
#[must_use]
pub fn parse_code(source: &str, language: &str) -> FileAnalysis {
    Extractor::new().extract(source, Language::from_tag(language))
}

/// Analyze one file, detecting the language from its extension
#[must_use]
pub fn parse_file(path: &str, source: &str) -> FileAnalysis {
    Extractor::new().extract_file(Some(path), source, Language::from_path(path))
}
