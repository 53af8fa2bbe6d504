//! Regex-based extraction used when no grammar is available or parsing fails.
//!
//! Two pattern families are supported: curly-brace languages
//! (JavaScript/TypeScript, Java, Go, Rust, C-family, PHP) and `def`-style
//! languages (Python, Ruby). Results have the same shape as the AST path but
//! are best-effort: no scope analysis, no destructuring, and per-function
//! complexity is always reported as 1.

use crate::language::{Language, SyntaxFamily};
use crate::metrics::{build_metrics, complexity_level};
use crate::types::{
    AnalysisSource, ClassInfo, ExportInfo, ExportKind, FileAnalysis, FunctionInfo, ImportInfo,
    ImportKind, ImportSpecifier, MethodInfo, MethodKind,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

macro_rules! pattern {
    ($re:expr) => {
        Lazy::new(|| Regex::new($re).expect("heuristic pattern compiles"))
    };
}

// Curly-brace family -----------------------------------------------------

static JS_FUNCTION: Lazy<Regex> = pattern!(
    r"^\s*(?:export\s+)?(?:default\s+)?(?P<async>async\s+)?function\s*(?P<gen>\*)?\s*(?P<name>[A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)?"
);
static JS_ARROW: Lazy<Regex> = pattern!(
    r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?P<async>async\s+)?(?:function\s*(?P<gen>\*)?\s*\((?P<params>[^)]*)\)|\((?P<aparams>[^)]*)\)\s*(?::[^=]+)?=>|(?P<aparam>[A-Za-z_$][\w$]*)\s*=>)"
);
static GO_FUNC: Lazy<Regex> =
    pattern!(r"^\s*func\s+(?P<recv>\([^)]*\)\s*)?(?P<name>[A-Za-z_]\w*)\s*(?:\[[^\]]*\])?\((?P<params>[^)]*)\)?");
static RUST_FN: Lazy<Regex> = pattern!(
    r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?P<async>async\s+)?(?:unsafe\s+)?(?:extern\s+\S+\s+)?fn\s+(?P<name>[A-Za-z_]\w*)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)?"
);
static KOTLIN_SWIFT_FUNC: Lazy<Regex> = pattern!(
    r"^\s*(?:(?:public|private|protected|internal|open|override|static|suspend|inline|final|@\w+)\s+)*(?:fun|func)\s+(?:<[^>]*>\s*)?(?P<name>[A-Za-z_]\w*)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)?"
);
static PHP_FUNCTION: Lazy<Regex> = pattern!(
    r"^\s*(?:(?:public|private|protected|static|abstract|final)\s+)*function\s+&?(?P<name>[A-Za-z_]\w*)\s*\((?P<params>[^)]*)\)?"
);
static C_LIKE_METHOD: Lazy<Regex> = pattern!(
    r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|virtual|override|async|inline|synchronized|extern|unsafe)\s+)*(?P<ret>[\w<>\[\],.*&:?]+)\s+\**(?P<name>[A-Za-z_]\w*)\s*\((?P<params>[^)]*)\)\s*(?:const\s*)?(?:throws\s+[\w.,\s]+)?\{?\s*$"
);

static CURLY_CLASS: Lazy<Regex> = pattern!(
    r"^\s*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:(?:public|private|protected|internal|abstract|final|sealed|static|data|open|partial|pub(?:\([^)]*\))?)\s+)*(?:class|struct|interface|trait|enum)\s+(?P<name>[A-Za-z_$][\w$]*)(?:\s*<[^>{]*>)?(?:\s*(?:extends|:)\s*(?P<base>[A-Za-z_$][\w$.]*))?"
);
static GO_TYPE: Lazy<Regex> =
    pattern!(r"^\s*type\s+(?P<name>[A-Za-z_]\w*)\s+(?:struct|interface)\b");

static JS_EXPORT_DECL: Lazy<Regex> = pattern!(
    r"^\s*export\s+(?:declare\s+)?(?P<default>default\s+)?(?:async\s+)?(?:abstract\s+)?(?P<kw>function\s*\*?|class|const|let|var|interface|type|enum)\s*(?P<name>[A-Za-z_$][\w$]*)"
);
static JS_EXPORT_DEFAULT: Lazy<Regex> =
    pattern!(r"^\s*export\s+default\s+(?P<name>[A-Za-z_$][\w$]*)?");
static JS_EXPORT_CLAUSE: Lazy<Regex> = pattern!(
    r#"^\s*export\s+(?:type\s+)?\{(?P<names>[^}]*)\}(?:\s*from\s*['"](?P<source>[^'"]+)['"])?"#
);
static JS_EXPORT_STAR: Lazy<Regex> = pattern!(
    r#"^\s*export\s+\*\s*(?:as\s+(?P<ns>[A-Za-z_$][\w$]*)\s+)?from\s*['"](?P<source>[^'"]+)['"]"#
);
static CJS_EXPORT: Lazy<Regex> =
    pattern!(r"^\s*(?:module\.)?exports\.(?P<name>[A-Za-z_$][\w$]*)\s*=[^=]");
static CJS_EXPORT_DEFAULT: Lazy<Regex> = pattern!(r"^\s*module\.exports\s*=[^=]");
static PUBLIC_DECL: Lazy<Regex> = pattern!(r"^\s*(?:pub(?:\([^)]*\))?|public)\s");

static JS_IMPORT_FROM: Lazy<Regex> = pattern!(
    r#"^\s*import\s+(?:type\s+)?(?P<clause>[^'"]+?)\s+from\s*['"](?P<source>[^'"]+)['"]"#
);
static JS_IMPORT_BARE: Lazy<Regex> = pattern!(r#"^\s*import\s*['"](?P<source>[^'"]+)['"]"#);
static JS_REQUIRE: Lazy<Regex> = pattern!(
    r#"(?:(?:const|let|var)\s+(?P<bind>[^=]+?)\s*=\s*)?\brequire\(\s*['"](?P<source>[^'"]+)['"]\s*\)"#
);
static JS_DYNAMIC_IMPORT: Lazy<Regex> =
    pattern!(r#"\bimport\(\s*['"](?P<source>[^'"]+)['"]\s*\)"#);
static GO_IMPORT: Lazy<Regex> =
    pattern!(r#"^\s*import\s+(?:(?P<alias>[\w.]+)\s+)?"(?P<source>[^"]+)""#);
static GO_IMPORT_LINE: Lazy<Regex> =
    pattern!(r#"^\s*(?:(?P<alias>[\w.]+)\s+)?"(?P<source>[^"]+)""#);
static JVM_IMPORT: Lazy<Regex> =
    pattern!(r"^\s*import\s+(?:static\s+)?(?P<source>[\w.]+(?:\.\*)?)\s*;?");
static C_INCLUDE: Lazy<Regex> = pattern!(r#"^\s*#\s*include\s*[<"](?P<source>[^>"]+)[>"]"#);
static RUST_USE: Lazy<Regex> = pattern!(r"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+(?P<source>[\w:]+)");
static CSHARP_USING: Lazy<Regex> = pattern!(r"^\s*using\s+(?:static\s+)?(?P<source>[\w.]+)\s*;");
static PHP_IMPORT: Lazy<Regex> = pattern!(
    r#"^\s*(?:(?:require|include)(?:_once)?\s*\(?\s*['"](?P<source>[^'"]+)['"]|use\s+(?P<ns>[\w\\]+))"#
);

// Indentation family -----------------------------------------------------

static PY_DEF: Lazy<Regex> = pattern!(
    r"^(?P<async>async\s+)?def\s+(?P<name>[A-Za-z_]\w*)\s*\((?P<params>[^)]*)\)?"
);
static PY_CLASS: Lazy<Regex> =
    pattern!(r"^class\s+(?P<name>[A-Za-z_]\w*)\s*(?:\((?P<bases>[^)]*)\))?\s*:");
static PY_FROM_IMPORT: Lazy<Regex> =
    pattern!(r"^from\s+(?P<source>[.\w]+)\s+import\s+(?P<names>.+)$");
static PY_IMPORT: Lazy<Regex> = pattern!(r"^import\s+(?P<names>.+)$");
static PY_ALL: Lazy<Regex> = pattern!(r"^__all__\s*=\s*[\[(](?P<names>[^\])]*)");
static RB_DEF: Lazy<Regex> = pattern!(
    r"^def\s+(?P<singleton>self\.)?(?P<name>[A-Za-z_]\w*[?!=]?)\s*(?:\(?(?P<params>[^)#]*)\)?)?"
);
static RB_CLASS: Lazy<Regex> = pattern!(
    r"^(?:class|module)\s+(?P<name>[A-Z]\w*(?:::\w+)*)(?:\s*<\s*(?P<bases>[\w:]+))?"
);
static RB_REQUIRE: Lazy<Regex> =
    pattern!(r#"^(?P<kind>require|require_relative|load)\s*\(?\s*['"](?P<source>[^'"]+)['"]"#);

static DECISION_POINTS: Lazy<Regex> = pattern!(
    r"\b(?:if|elif|for|foreach|while|until|unless|catch|except|rescue|case|when|and|or)\b|&&|\|\||\s\?\s"
);
static STRING_LITERAL: Lazy<Regex> = pattern!(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#);

const NOT_A_FUNCTION: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "else", "sizeof", "throw", "await",
    "typeof", "delete", "case", "do", "try", "using", "lock", "foreach", "yield", "goto",
];

/// Extract best-effort structure with regular expressions. Never fails.
#[must_use]
pub fn extract(source: &str, language: Language) -> FileAnalysis {
    if source.trim().is_empty() {
        return FileAnalysis::empty(AnalysisSource::Heuristic);
    }

    let mut scan = match language.syntax_family() {
        SyntaxFamily::CurlyBrace => scan_curly(source, language),
        SyntaxFamily::Indentation => scan_indented(source, language),
    };
    scan.dedup_functions();

    let cyclomatic = estimate_cyclomatic(source, language);
    let complexity = complexity_level(
        scan.functions.len(),
        scan.classes.len(),
        scan.exports.len(),
        scan.imports.len(),
        cyclomatic,
    );
    let metrics = build_metrics(
        source,
        language,
        cyclomatic,
        scan.max_depth,
        scan.functions.len(),
        scan.classes.len(),
    );

    FileAnalysis {
        functions: scan.functions,
        classes: scan.classes,
        exports: scan.exports,
        imports: scan.imports,
        variables: Vec::new(),
        cyclomatic_complexity: cyclomatic,
        complexity,
        metrics,
        source: AnalysisSource::Heuristic,
    }
}

#[derive(Default)]
struct Scan {
    functions: Vec<FunctionInfo>,
    classes: Vec<ClassInfo>,
    exports: Vec<ExportInfo>,
    imports: Vec<ImportInfo>,
    max_depth: usize,
}

impl Scan {
    fn dedup_functions(&mut self) {
        let mut seen = HashSet::new();
        self.functions.retain(|f| seen.insert(f.name.clone()));
    }

    fn push_export(&mut self, name: impl Into<String>, kind: ExportKind, line: usize) {
        let name = name.into();
        if !self.exports.iter().any(|e| e.name == name && e.kind == kind) {
            self.exports.push(ExportInfo::new(name, kind, line));
        }
    }
}

// ----------------------------------------------------------------------
// Curly-brace languages
// ----------------------------------------------------------------------

fn scan_curly(source: &str, language: Language) -> Scan {
    let mut scan = Scan::default();
    let mut depth = 0usize;
    let mut in_go_import_block = false;
    let is_js = matches!(
        language,
        Language::JavaScript | Language::TypeScript | Language::Tsx | Language::Unknown
    );
    let patterns = function_patterns(language);

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();
        let trimmed = line.trim_start();
        if trimmed.is_empty() || is_line_comment(trimmed) {
            continue;
        }

        let top_level = depth == 0;

        if language == Language::Go {
            if in_go_import_block {
                if trimmed.starts_with(')') {
                    in_go_import_block = false;
                } else if let Some(caps) = GO_IMPORT_LINE.captures(trimmed) {
                    scan.imports.push(go_import(&caps, line_no));
                }
                continue;
            }
            if trimmed.starts_with("import (") || trimmed == "import(" {
                in_go_import_block = true;
                continue;
            }
        }

        if let Some((function, is_method)) = match_curly_function(line, &patterns, language, line_no)
        {
            let is_public = match language {
                Language::Go => starts_uppercase(&function.name),
                _ => PUBLIC_DECL.is_match(line),
            };
            if top_level && is_public && !is_method && !is_js {
                scan.push_export(function.name.clone(), ExportKind::Function, line_no);
            }
            scan.functions.push(function);
        } else if let Some(class) = match_curly_class(line, language, line_no) {
            let is_public = match language {
                Language::Go => starts_uppercase(&class.name),
                _ => PUBLIC_DECL.is_match(line),
            };
            if top_level && is_public && !is_js {
                scan.push_export(class.name.clone(), ExportKind::Class, line_no);
            }
            scan.classes.push(class);
        }

        if is_js {
            collect_js_exports(trimmed, line_no, &mut scan);
            collect_js_imports(trimmed, line_no, &mut scan);
        } else {
            collect_curly_imports(trimmed, language, line_no, &mut scan);
        }

        for ch in STRING_LITERAL.replace_all(line, "").chars() {
            match ch {
                '{' => {
                    depth += 1;
                    scan.max_depth = scan.max_depth.max(depth);
                }
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    scan
}

fn function_patterns(language: Language) -> Vec<&'static Regex> {
    match language {
        Language::JavaScript | Language::TypeScript | Language::Tsx | Language::Unknown => {
            vec![&*JS_FUNCTION, &*JS_ARROW]
        }
        Language::Go => vec![&*GO_FUNC],
        Language::Rust => vec![&*RUST_FN],
        Language::Kotlin | Language::Swift => vec![&*KOTLIN_SWIFT_FUNC],
        Language::Php => vec![&*PHP_FUNCTION],
        _ => vec![&*C_LIKE_METHOD],
    }
}

/// Function declared on `line`, and whether it is a receiver method (Go)
fn match_curly_function(
    line: &str,
    patterns: &[&Regex],
    language: Language,
    line_no: usize,
) -> Option<(FunctionInfo, bool)> {
    let name_first = language == Language::Go;
    patterns.iter().find_map(|re| {
        let caps = re.captures(line)?;
        let name = caps.name("name")?.as_str();
        if NOT_A_FUNCTION.contains(&name) {
            return None;
        }
        if let Some(ret) = caps.name("ret") {
            if NOT_A_FUNCTION.contains(&ret.as_str()) || ret.as_str() == "else" {
                return None;
            }
        }
        let params = caps
            .name("params")
            .or_else(|| caps.name("aparams"))
            .or_else(|| caps.name("aparam"))
            .map(|m| split_params(m.as_str(), name_first))
            .unwrap_or_default();
        let function = FunctionInfo {
            name: name.to_string(),
            params,
            is_async: caps.name("async").is_some(),
            is_generator: caps.name("gen").is_some(),
            line: line_no,
            complexity: 1,
        };
        Some((function, caps.name("recv").is_some()))
    })
}

fn match_curly_class(line: &str, language: Language, line_no: usize) -> Option<ClassInfo> {
    let caps = if language == Language::Go {
        GO_TYPE.captures(line)?
    } else {
        CURLY_CLASS.captures(line)?
    };
    Some(ClassInfo {
        name: caps.name("name")?.as_str().to_string(),
        superclass: caps.name("base").map(|m| m.as_str().to_string()),
        methods: Vec::new(),
        line: line_no,
    })
}

fn collect_js_exports(line: &str, line_no: usize, scan: &mut Scan) {
    if let Some(caps) = JS_EXPORT_DECL.captures(line) {
        let Some(name) = caps.name("name") else { return };
        let kind = if caps.name("default").is_some() {
            ExportKind::Default
        } else {
            match caps.name("kw").map_or("", |m| m.as_str().trim()) {
                kw if kw.starts_with("function") => ExportKind::Function,
                "class" => ExportKind::Class,
                "interface" | "type" | "enum" => ExportKind::Type,
                _ => ExportKind::Variable,
            }
        };
        scan.push_export(name.as_str(), kind, line_no);
    } else if let Some(caps) = JS_EXPORT_STAR.captures(line) {
        let source = caps["source"].to_string();
        let export = match caps.name("ns") {
            Some(ns) => ExportInfo::new(ns.as_str(), ExportKind::Namespace, line_no),
            None => ExportInfo::new("*", ExportKind::Reexport, line_no),
        };
        scan.exports.push(export.from_source(source));
    } else if let Some(caps) = JS_EXPORT_CLAUSE.captures(line) {
        let source = caps.name("source").map(|m| m.as_str().to_string());
        for part in caps["names"].split(',') {
            let Some(exported) = alias_target(part) else { continue };
            match &source {
                Some(src) => scan.exports.push(
                    ExportInfo::new(exported, ExportKind::Reexport, line_no).from_source(src.clone()),
                ),
                None => scan.push_export(exported, ExportKind::Named, line_no),
            }
        }
    } else if let Some(caps) = JS_EXPORT_DEFAULT.captures(line) {
        let name = caps.name("name").map_or("default", |m| m.as_str());
        let name = if matches!(name, "async" | "function" | "class" | "new") {
            "default"
        } else {
            name
        };
        scan.push_export(name, ExportKind::Default, line_no);
    } else if let Some(caps) = CJS_EXPORT.captures(line) {
        scan.push_export(&caps["name"], ExportKind::Named, line_no);
    } else if CJS_EXPORT_DEFAULT.is_match(line) {
        scan.push_export("default", ExportKind::Default, line_no);
    }
}

fn collect_js_imports(line: &str, line_no: usize, scan: &mut Scan) {
    if let Some(caps) = JS_IMPORT_FROM.captures(line) {
        scan.imports.push(ImportInfo {
            source: caps["source"].to_string(),
            specifiers: parse_import_clause(&caps["clause"]),
            kind: ImportKind::Static,
            line: line_no,
        });
        return;
    }
    if let Some(caps) = JS_IMPORT_BARE.captures(line) {
        scan.imports.push(ImportInfo {
            source: caps["source"].to_string(),
            specifiers: Vec::new(),
            kind: ImportKind::SideEffect,
            line: line_no,
        });
        return;
    }
    for caps in JS_REQUIRE.captures_iter(line) {
        let specifiers = caps
            .name("bind")
            .map(|b| parse_require_binding(b.as_str()))
            .unwrap_or_default();
        scan.imports.push(ImportInfo {
            source: caps["source"].to_string(),
            specifiers,
            kind: ImportKind::Require,
            line: line_no,
        });
    }
    for caps in JS_DYNAMIC_IMPORT.captures_iter(line) {
        scan.imports.push(ImportInfo {
            source: caps["source"].to_string(),
            specifiers: Vec::new(),
            kind: ImportKind::Dynamic,
            line: line_no,
        });
    }
}

fn collect_curly_imports(line: &str, language: Language, line_no: usize, scan: &mut Scan) {
    let source = match language {
        Language::Go => {
            if let Some(caps) = GO_IMPORT.captures(line) {
                scan.imports.push(go_import(&caps, line_no));
            }
            return;
        }
        Language::Java | Language::Kotlin | Language::Swift => JVM_IMPORT
            .captures(line)
            .map(|c| c["source"].to_string()),
        Language::C | Language::Cpp => C_INCLUDE.captures(line).map(|c| c["source"].to_string()),
        Language::Rust => RUST_USE.captures(line).map(|c| c["source"].to_string()),
        Language::CSharp => CSHARP_USING
            .captures(line)
            .map(|c| c["source"].to_string()),
        Language::Php => PHP_IMPORT.captures(line).and_then(|c| {
            c.name("source")
                .or_else(|| c.name("ns"))
                .map(|m| m.as_str().to_string())
        }),
        _ => None,
    };

    if let Some(source) = source {
        let local = source
            .rsplit(['.', ':', '/', '\\'])
            .find(|s| !s.is_empty() && *s != "*")
            .unwrap_or(source.as_str())
            .to_string();
        scan.imports.push(ImportInfo {
            source,
            specifiers: vec![ImportSpecifier::namespace(local)],
            kind: ImportKind::Static,
            line: line_no,
        });
    }
}

fn go_import(caps: &regex::Captures, line_no: usize) -> ImportInfo {
    let source = caps["source"].to_string();
    let local = caps.name("alias").map_or_else(
        || source.rsplit('/').next().unwrap_or(source.as_str()).to_string(),
        |a| a.as_str().to_string(),
    );
    ImportInfo {
        source,
        specifiers: vec![ImportSpecifier::namespace(local)],
        kind: ImportKind::Static,
        line: line_no,
    }
}

/// `React, { useState as s }` / `* as ns` / `Foo`
fn parse_import_clause(clause: &str) -> Vec<ImportSpecifier> {
    let mut specifiers = Vec::new();
    let (outside, inside) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => (
            format!("{}{}", &clause[..open], &clause[close + 1..]),
            Some(&clause[open + 1..close]),
        ),
        _ => (clause.to_string(), None),
    };

    for part in outside.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(ns) = part.strip_prefix('*') {
            let local = ns.trim().trim_start_matches("as").trim();
            if !local.is_empty() {
                specifiers.push(ImportSpecifier::namespace(local));
            }
        } else if is_identifier(part) {
            specifiers.push(ImportSpecifier::default_binding(part));
        }
    }

    if let Some(inside) = inside {
        for part in inside.split(',') {
            let part = part.trim().trim_start_matches("type ").trim();
            if part.is_empty() {
                continue;
            }
            let (imported, local) = split_alias(part);
            specifiers.push(ImportSpecifier::named(imported, local));
        }
    }

    specifiers
}

fn parse_require_binding(binding: &str) -> Vec<ImportSpecifier> {
    let binding = binding.trim();
    if let Some(inner) = binding.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
        return inner
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|part| {
                let (imported, local) = match part.split_once(':') {
                    Some((imported, local)) => (imported.trim(), local.trim()),
                    None => (part, part),
                };
                ImportSpecifier::named(imported, local)
            })
            .collect();
    }
    if is_identifier(binding) {
        return vec![ImportSpecifier::default_binding(binding)];
    }
    Vec::new()
}

// ----------------------------------------------------------------------
// def-style languages
// ----------------------------------------------------------------------

struct OpenClass {
    index: usize,
    indent: usize,
}

fn scan_indented(source: &str, language: Language) -> Scan {
    let mut scan = Scan::default();
    let mut open_classes: Vec<OpenClass> = Vec::new();
    let mut decorators: Vec<String> = Vec::new();
    let mut all_names: Option<Vec<String>> = None;
    let indent_unit = detect_indent_unit(source);

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = indentation_width(raw);
        scan.max_depth = scan.max_depth.max(indent / indent_unit);

        while open_classes.last().is_some_and(|c| indent <= c.indent) {
            open_classes.pop();
        }
        if language == Language::Ruby && trimmed == "end" {
            continue;
        }

        if let Some(decorator) = trimmed.strip_prefix('@') {
            decorators.push(decorator.trim().to_string());
            continue;
        }
        let pending_decorators = std::mem::take(&mut decorators);

        let (def, class) = match language {
            Language::Ruby => (RB_DEF.captures(trimmed), RB_CLASS.captures(trimmed)),
            _ => (PY_DEF.captures(trimmed), PY_CLASS.captures(trimmed)),
        };

        if let Some(caps) = def {
            let name = caps["name"].to_string();
            let params = caps
                .name("params")
                .map(|m| split_params(m.as_str(), false))
                .unwrap_or_default();
            let is_async = caps.name("async").is_some();

            if let Some(open) = open_classes.last() {
                let is_static = caps.name("singleton").is_some()
                    || pending_decorators
                        .iter()
                        .any(|d| d == "staticmethod" || d == "classmethod");
                let kind = if pending_decorators.iter().any(|d| d == "property") {
                    MethodKind::Get
                } else if pending_decorators.iter().any(|d| d.ends_with(".setter")) {
                    MethodKind::Set
                } else if name == "__init__" || name == "initialize" {
                    MethodKind::Constructor
                } else {
                    MethodKind::Method
                };
                let is_private = name.starts_with('_') && !is_dunder(&name);
                scan.classes[open.index].methods.push(MethodInfo {
                    name,
                    kind,
                    is_static,
                    is_private,
                    is_async,
                    computed: false,
                    params,
                    line: line_no,
                });
            } else {
                if indent == 0 && !name.starts_with('_') {
                    scan.push_export(name.clone(), ExportKind::Function, line_no);
                }
                scan.functions.push(FunctionInfo {
                    name,
                    params,
                    is_async,
                    is_generator: false,
                    line: line_no,
                    complexity: 1,
                });
            }
            continue;
        }

        if let Some(caps) = class {
            let name = caps["name"].to_string();
            let superclass = caps.name("bases").and_then(|b| {
                b.as_str()
                    .split(',')
                    .map(str::trim)
                    .find(|base| !base.is_empty() && !base.contains('='))
                    .map(str::to_string)
            });
            if indent == 0 && !name.starts_with('_') {
                scan.push_export(name.clone(), ExportKind::Class, line_no);
            }
            open_classes.push(OpenClass {
                index: scan.classes.len(),
                indent,
            });
            scan.classes.push(ClassInfo {
                name,
                superclass,
                methods: Vec::new(),
                line: line_no,
            });
            continue;
        }

        match language {
            Language::Ruby => {
                if let Some(caps) = RB_REQUIRE.captures(trimmed) {
                    let source = caps["source"].to_string();
                    let source = if &caps["kind"] == "require_relative" && !source.starts_with('.')
                    {
                        format!("./{source}")
                    } else {
                        source
                    };
                    scan.imports.push(ImportInfo {
                        source,
                        specifiers: Vec::new(),
                        kind: ImportKind::Require,
                        line: line_no,
                    });
                }
            }
            _ => {
                if indent == 0 {
                    if let Some(caps) = PY_ALL.captures(trimmed) {
                        all_names = Some(
                            caps["names"]
                                .split(',')
                                .map(|n| n.trim().trim_matches(['"', '\'']).to_string())
                                .filter(|n| !n.is_empty())
                                .collect(),
                        );
                        continue;
                    }
                }
                collect_python_imports(trimmed, line_no, &mut scan);
            }
        }
    }

    // `__all__` narrows the public surface to the listed names.
    if let Some(names) = all_names {
        scan.exports.retain(|e| names.contains(&e.name));
        for name in names {
            if !scan.exports.iter().any(|e| e.name == name) {
                scan.exports.push(ExportInfo::new(name, ExportKind::Named, 0));
            }
        }
    }

    scan
}

fn collect_python_imports(line: &str, line_no: usize, scan: &mut Scan) {
    if let Some(caps) = PY_FROM_IMPORT.captures(line) {
        let names = caps["names"].trim().trim_matches(['(', ')']);
        let specifiers = names
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != "*")
            .map(|part| {
                let (imported, local) = split_alias(part);
                ImportSpecifier::named(imported, local)
            })
            .collect();
        scan.imports.push(ImportInfo {
            source: caps["source"].to_string(),
            specifiers,
            kind: ImportKind::Static,
            line: line_no,
        });
    } else if let Some(caps) = PY_IMPORT.captures(line) {
        for part in caps["names"].split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (module, local) = split_alias(part);
            scan.imports.push(ImportInfo {
                source: module.to_string(),
                specifiers: vec![ImportSpecifier::namespace(local)],
                kind: ImportKind::Static,
                line: line_no,
            });
        }
    }
}

// ----------------------------------------------------------------------
// Shared helpers
// ----------------------------------------------------------------------

/// Decision keywords and operators outside comments and string literals, plus one
fn estimate_cyclomatic(source: &str, language: Language) -> u32 {
    let hash_comments = language.syntax_family() == SyntaxFamily::Indentation;
    let mut complexity = 1u32;

    for line in source.lines() {
        let trimmed = line.trim();
        let is_comment = if hash_comments {
            trimmed.starts_with('#')
        } else {
            is_line_comment(trimmed)
        };
        if trimmed.is_empty() || is_comment {
            continue;
        }
        let code = STRING_LITERAL.replace_all(trimmed, "\"\"");
        let hits = DECISION_POINTS.find_iter(&code).count();
        complexity = complexity.saturating_add(u32::try_from(hits).unwrap_or(u32::MAX));
    }

    complexity
}

fn is_line_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

/// Parameter names from a raw list; `name_first` for `name type` languages (Go)
fn split_params(raw: &str, name_first: bool) -> Vec<String> {
    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();

    for ch in raw.chars() {
        match ch {
            '(' | '[' | '{' | '<' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' | '>' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth <= 0 => {
                params.extend(param_name(&current, name_first));
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    params.extend(param_name(&current, name_first));
    params
}

/// Strip type annotations and defaults from a single parameter
fn param_name(raw: &str, name_first: bool) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('{') {
        return Some("{destructured}".to_string());
    }
    if raw.starts_with('[') {
        return Some("[destructured]".to_string());
    }
    let head = raw.split(['=', ':']).next().unwrap_or(raw).trim();
    // `int count` / `count int` / `&self`: keep the identifier-looking token.
    let mut tokens = head
        .split_whitespace()
        .filter(|token| !matches!(*token, "mut" | "const" | "final" | "ref" | "out"));
    let name = if name_first {
        tokens.next()
    } else {
        tokens.last()
    }
    .unwrap_or(head);
    let name = name
        .trim_start_matches(['&', '$', '*'])
        .trim_end_matches("[]")
        .trim_end_matches('?');
    (!name.is_empty()).then(|| name.to_string())
}

/// Local binding from `a as b` / `a`
fn alias_target(part: &str) -> Option<String> {
    let part = part.trim().trim_start_matches("type ").trim();
    if part.is_empty() {
        return None;
    }
    Some(split_alias(part).1.to_string())
}

fn split_alias(part: &str) -> (&str, &str) {
    match part.split_once(" as ") {
        Some((imported, local)) => (imported.trim(), local.trim()),
        None => (part.trim(), part.trim()),
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn indentation_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn detect_indent_unit(source: &str) -> usize {
    source
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(indentation_width)
        .filter(|w| *w > 0)
        .min()
        .unwrap_or(4)
}
