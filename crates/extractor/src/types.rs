use serde::{Deserialize, Serialize};

/// Which extractor produced a [`FileAnalysis`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Ast,
    Heuristic,
}

/// Structural facts and metrics extracted from one source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub exports: Vec<ExportInfo>,
    pub imports: Vec<ImportInfo>,
    pub variables: Vec<VariableInfo>,
    pub cyclomatic_complexity: u32,
    pub complexity: ComplexityLevel,
    pub metrics: CodeMetrics,
    pub source: AnalysisSource,
}

impl FileAnalysis {
    /// Well-formed result with nothing detected
    #[must_use]
    pub fn empty(source: AnalysisSource) -> Self {
        Self {
            functions: Vec::new(),
            classes: Vec::new(),
            exports: Vec::new(),
            imports: Vec::new(),
            variables: Vec::new(),
            cyclomatic_complexity: 1,
            complexity: ComplexityLevel::Simple,
            metrics: CodeMetrics::default(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<String>,
    pub is_async: bool,
    pub is_generator: bool,
    /// 1-based
    pub line: usize,
    pub complexity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<String>,
    pub methods: Vec<MethodInfo>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Method,
    Constructor,
    Get,
    Set,
    Field,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub name: String,
    pub kind: MethodKind,
    pub is_static: bool,
    pub is_private: bool,
    pub is_async: bool,
    pub computed: bool,
    pub params: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Function,
    Class,
    Variable,
    /// TypeScript interface, type alias or enum
    Type,
    /// `export { a, b as c }`
    Named,
    Default,
    /// `export * as ns from "..."`
    Namespace,
    /// `export { a } from "..."` and `export * from "..."`
    Reexport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    pub name: String,
    pub kind: ExportKind,
    /// Module specifier for re-exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub line: usize,
}

impl ExportInfo {
    pub fn new(name: impl Into<String>, kind: ExportKind, line: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            source: None,
            line,
        }
    }

    #[must_use]
    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportKind {
    /// `import ... from "x"`
    Static,
    /// `import "x"`
    SideEffect,
    /// `import("x")`
    Dynamic,
    /// `require("x")`
    Require,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecifierKind {
    Named,
    Default,
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpecifier {
    /// Binding name in the importing module
    pub local: String,
    /// Name exported by the source module (`default` / `*` for default and namespace)
    pub imported: String,
    pub kind: SpecifierKind,
}

impl ImportSpecifier {
    pub fn named(imported: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            imported: imported.into(),
            kind: SpecifierKind::Named,
        }
    }

    pub fn default_binding(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            imported: "default".to_string(),
            kind: SpecifierKind::Default,
        }
    }

    pub fn namespace(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            imported: "*".to_string(),
            kind: SpecifierKind::Namespace,
        }
    }

    /// Name used when labelling graph edges
    #[must_use]
    pub fn edge_label(&self) -> &str {
        match self.kind {
            SpecifierKind::Named => &self.imported,
            SpecifierKind::Default | SpecifierKind::Namespace => &self.local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportInfo {
    pub source: String,
    pub specifiers: Vec<ImportSpecifier>,
    pub kind: ImportKind,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableInfo {
    pub name: String,
    pub kind: DeclarationKind,
    pub destructured: bool,
    pub has_default: bool,
    pub is_rest: bool,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Simple,
    Medium,
    Complex,
}

impl ComplexityLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetrics {
    pub total_lines: usize,
    /// Non-blank, non-comment lines
    pub lines_of_code: usize,
    pub max_nesting_depth: usize,
    pub maintainability_index: f64,
    pub function_count: usize,
    pub class_count: usize,
}

impl Default for CodeMetrics {
    fn default() -> Self {
        Self {
            total_lines: 0,
            lines_of_code: 0,
            max_nesting_depth: 0,
            maintainability_index: 100.0,
            function_count: 0,
            class_count: 0,
        }
    }
}
