use super::context::NamingContext;
use crate::metrics::cyclomatic_complexity;
use crate::types::{
    ClassInfo, DeclarationKind, ExportInfo, ExportKind, FunctionInfo, ImportInfo, ImportKind,
    ImportSpecifier, MethodInfo, MethodKind, VariableInfo,
};
use tree_sitter::Node;

const DESTRUCTURED_OBJECT: &str = "{destructured}";
const DESTRUCTURED_ARRAY: &str = "[destructured]";

/// Single-pass collector over a JavaScript / TypeScript syntax tree
pub(crate) struct Visitor<'s> {
    source: &'s [u8],
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub exports: Vec<ExportInfo>,
    pub imports: Vec<ImportInfo>,
    pub variables: Vec<VariableInfo>,
}

/// A binding found inside a (possibly destructured) declaration pattern
struct Binding {
    name: String,
    has_default: bool,
    is_rest: bool,
}

impl<'s> Visitor<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source: source.as_bytes(),
            functions: Vec::new(),
            classes: Vec::new(),
            exports: Vec::new(),
            imports: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn visit(&mut self, node: Node<'s>, ctx: &NamingContext) {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                let name = self
                    .field_text(node, "name")
                    .unwrap_or_else(|| ctx.name_or_anonymous());
                self.record_function(node, name);
                self.visit_children(node);
            }
            "function_expression" | "function" | "generator_function" | "arrow_function" => {
                // A named function expression keeps its own name.
                let name = self
                    .field_text(node, "name")
                    .unwrap_or_else(|| ctx.name_or_anonymous());
                self.record_function(node, name);
                self.visit_children(node);
            }
            "class_declaration" | "abstract_class_declaration" | "class" => {
                self.record_class(node, ctx);
            }
            "method_definition" => {
                // Class bodies are handled by `record_class`; this is an object literal method.
                let name = node
                    .child_by_field_name("name")
                    .map_or_else(|| ctx.name_or_anonymous(), |n| self.property_key(n));
                self.record_function(node, name);
                self.visit_children(node);
            }
            "variable_declarator" => self.visit_declarator(node),
            "pair" => {
                let key = node.child_by_field_name("key");
                if let Some(key) = key {
                    self.visit(key, &NamingContext::None);
                }
                if let Some(value) = node.child_by_field_name("value") {
                    let ctx = key.map_or(NamingContext::None, |k| {
                        NamingContext::ObjectProperty(self.property_key(k))
                    });
                    self.visit(value, &ctx);
                }
            }
            "assignment_expression" => {
                let left = node.child_by_field_name("left");
                if let Some(left) = left {
                    self.visit(left, &NamingContext::None);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    let ctx = left
                        .and_then(|l| self.assignment_target(l))
                        .map_or(NamingContext::None, NamingContext::AssignmentTarget);
                    self.visit(right, &ctx);
                }
            }
            "parenthesized_expression" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.visit(child, ctx);
                }
            }
            "export_statement" => {
                self.record_export(node);
                self.visit_children(node);
            }
            "import_statement" => self.record_import(node),
            "call_expression" => {
                self.record_call_import(node);
                self.visit_children(node);
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'s>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, &NamingContext::None);
        }
    }

    // ------------------------------------------------------------------
    // Functions and classes
    // ------------------------------------------------------------------

    fn record_function(&mut self, node: Node<'s>, name: String) {
        let is_generator = node.kind().contains("generator") || has_token(node, "*");
        self.functions.push(FunctionInfo {
            name,
            params: self.function_params(node),
            is_async: has_token(node, "async"),
            is_generator,
            line: line_of(node),
            complexity: cyclomatic_complexity(node, self.source),
        });
    }

    fn function_params(&self, node: Node<'s>) -> Vec<String> {
        if let Some(single) = node.child_by_field_name("parameter") {
            return vec![self.param_label(single)];
        }
        let Some(params) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };

        let mut cursor = params.walk();
        params
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .map(|child| match child.kind() {
                "required_parameter" | "optional_parameter" => child
                    .child_by_field_name("pattern")
                    .map_or_else(|| self.text(child).to_string(), |p| self.param_label(p)),
                _ => self.param_label(child),
            })
            .collect()
    }

    fn param_label(&self, node: Node<'s>) -> String {
        match node.kind() {
            "assignment_pattern" => node
                .child_by_field_name("left")
                .map_or_else(|| self.text(node).to_string(), |l| self.param_label(l)),
            "rest_pattern" => {
                let mut cursor = node.walk();
                let inner = node
                    .named_children(&mut cursor)
                    .next()
                    .map_or_else(String::new, |n| self.param_label(n));
                format!("...{inner}")
            }
            "object_pattern" => DESTRUCTURED_OBJECT.to_string(),
            "array_pattern" => DESTRUCTURED_ARRAY.to_string(),
            _ => self.text(node).to_string(),
        }
    }

    fn record_class(&mut self, node: Node<'s>, ctx: &NamingContext) {
        let name = self
            .field_text(node, "name")
            .unwrap_or_else(|| ctx.name_or_anonymous());
        let superclass = self.superclass(node);

        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                match member.kind() {
                    "method_definition" | "abstract_method_signature" | "method_signature" => {
                        methods.push(self.method_info(member, "name", false));
                        self.visit_children(member);
                    }
                    "field_definition" | "public_field_definition" => {
                        let key_field = if member.kind() == "field_definition" {
                            "property"
                        } else {
                            "name"
                        };
                        let field = self.method_info(member, key_field, true);
                        if let Some(value) = member.child_by_field_name("value") {
                            let ctx = NamingContext::ObjectProperty(field.name.clone());
                            self.visit(value, &ctx);
                        }
                        methods.push(field);
                    }
                    _ => self.visit(member, &NamingContext::None),
                }
            }
        }

        self.classes.push(ClassInfo {
            name,
            superclass,
            methods,
            line: line_of(node),
        });
    }

    fn superclass(&self, class: Node<'s>) -> Option<String> {
        let mut cursor = class.walk();
        let heritage = class
            .named_children(&mut cursor)
            .find(|c| c.kind() == "class_heritage")?;

        let mut cursor = heritage.walk();
        let first = heritage.named_children(&mut cursor).next()?;
        if first.kind() == "extends_clause" {
            let value = first.child_by_field_name("value").or_else(|| {
                let mut cursor = first.walk();
                let found = first.named_children(&mut cursor).next();
                found
            })?;
            return Some(self.text(value).to_string());
        }
        if first.kind() == "implements_clause" {
            return None;
        }
        Some(self.text(first).to_string())
    }

    fn method_info(&self, member: Node<'s>, key_field: &str, is_field: bool) -> MethodInfo {
        let key = member.child_by_field_name(key_field);
        let (name, mut is_private, computed) = match key {
            Some(key) => match key.kind() {
                "private_property_identifier" => (
                    self.text(key).trim_start_matches('#').to_string(),
                    true,
                    false,
                ),
                "computed_property_name" => (self.text(key).to_string(), false, true),
                _ => (self.property_key(key), false, false),
            },
            None => (super::context::ANONYMOUS.to_string(), false, false),
        };

        let mut cursor = member.walk();
        if member
            .named_children(&mut cursor)
            .any(|c| c.kind() == "accessibility_modifier" && self.text(c) == "private")
        {
            is_private = true;
        }

        let kind = if is_field {
            MethodKind::Field
        } else if name == "constructor" && !computed {
            MethodKind::Constructor
        } else if has_token(member, "get") {
            MethodKind::Get
        } else if has_token(member, "set") {
            MethodKind::Set
        } else {
            MethodKind::Method
        };

        MethodInfo {
            name,
            kind,
            is_static: has_token(member, "static"),
            is_private,
            is_async: has_token(member, "async"),
            computed,
            params: if is_field {
                Vec::new()
            } else {
                self.function_params(member)
            },
            line: line_of(member),
        }
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    fn visit_declarator(&mut self, node: Node<'s>) {
        let kind = declaration_kind(node, self.source);
        let line = line_of(node);
        let mut ctx = NamingContext::None;

        if let Some(name) = node.child_by_field_name("name") {
            if name.kind() == "identifier" {
                let name = self.text(name).to_string();
                self.variables.push(VariableInfo {
                    name: name.clone(),
                    kind,
                    destructured: false,
                    has_default: false,
                    is_rest: false,
                    line,
                });
                ctx = NamingContext::VariableDeclarator(name);
            } else {
                let mut bindings = Vec::new();
                self.collect_bindings(name, false, false, &mut bindings);
                self.variables
                    .extend(bindings.into_iter().map(|b| VariableInfo {
                        name: b.name,
                        kind,
                        destructured: true,
                        has_default: b.has_default,
                        is_rest: b.is_rest,
                        line,
                    }));
            }
        }

        if let Some(value) = node.child_by_field_name("value") {
            self.visit(value, &ctx);
        }
    }

    fn collect_bindings(
        &self,
        node: Node<'s>,
        has_default: bool,
        is_rest: bool,
        out: &mut Vec<Binding>,
    ) {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => out.push(Binding {
                name: self.text(node).to_string(),
                has_default,
                is_rest,
            }),
            "object_pattern" | "array_pattern" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.collect_bindings(child, false, false, out);
                }
            }
            "pair_pattern" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.collect_bindings(value, has_default, is_rest, out);
                }
            }
            "object_assignment_pattern" | "assignment_pattern" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.collect_bindings(left, true, is_rest, out);
                }
            }
            "rest_pattern" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.collect_bindings(child, has_default, true, out);
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Modules
    // ------------------------------------------------------------------

    fn record_export(&mut self, node: Node<'s>) {
        let line = line_of(node);
        let source = node
            .child_by_field_name("source")
            .map(|s| self.string_value(s));
        let is_default = has_token(node, "default");

        if let Some(decl) = node.child_by_field_name("declaration") {
            let names = self.declaration_names(decl);
            for (name, kind) in names {
                let kind = if is_default { ExportKind::Default } else { kind };
                self.exports.push(ExportInfo::new(name, kind, line));
            }
            return;
        }

        if let Some(value) = node.child_by_field_name("value") {
            let name = match value.kind() {
                "identifier" => self.text(value).to_string(),
                _ => self
                    .field_text(value, "name")
                    .unwrap_or_else(|| "default".to_string()),
            };
            self.exports
                .push(ExportInfo::new(name, ExportKind::Default, line));
            return;
        }

        let mut found_clause = false;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "export_clause" => {
                    found_clause = true;
                    let mut inner = child.walk();
                    for spec in child.named_children(&mut inner) {
                        if spec.kind() != "export_specifier" {
                            continue;
                        }
                        let exported = spec
                            .child_by_field_name("alias")
                            .or_else(|| spec.child_by_field_name("name"))
                            .map(|n| self.module_export_name(n));
                        let Some(exported) = exported else { continue };
                        let export = match &source {
                            Some(src) => {
                                ExportInfo::new(exported, ExportKind::Reexport, line)
                                    .from_source(src.clone())
                            }
                            None => ExportInfo::new(exported, ExportKind::Named, line),
                        };
                        self.exports.push(export);
                    }
                }
                "namespace_export" => {
                    found_clause = true;
                    let mut inner = child.walk();
                    let name = child
                        .named_children(&mut inner)
                        .last()
                        .map_or_else(|| "*".to_string(), |n| self.module_export_name(n));
                    let mut export = ExportInfo::new(name, ExportKind::Namespace, line);
                    export.source.clone_from(&source);
                    self.exports.push(export);
                }
                _ => {}
            }
        }

        if !found_clause {
            if let Some(src) = source {
                if has_token(node, "*") {
                    self.exports
                        .push(ExportInfo::new("*", ExportKind::Reexport, line).from_source(src));
                }
            }
        }
    }

    /// Names introduced by an exported declaration
    fn declaration_names(&self, decl: Node<'s>) -> Vec<(String, ExportKind)> {
        match decl.kind() {
            "function_declaration" | "generator_function_declaration" | "function_signature" => self
                .field_text(decl, "name")
                .map(|n| vec![(n, ExportKind::Function)])
                .unwrap_or_default(),
            "class_declaration" | "abstract_class_declaration" | "class" => {
                let name = self
                    .field_text(decl, "name")
                    .unwrap_or_else(|| "default".to_string());
                vec![(name, ExportKind::Class)]
            }
            "interface_declaration" | "type_alias_declaration" | "enum_declaration" => self
                .field_text(decl, "name")
                .map(|n| vec![(n, ExportKind::Type)])
                .unwrap_or_default(),
            "lexical_declaration" | "variable_declaration" => {
                let mut names = Vec::new();
                let mut cursor = decl.walk();
                for declarator in decl.named_children(&mut cursor) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let Some(pattern) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    let mut bindings = Vec::new();
                    self.collect_bindings(pattern, false, false, &mut bindings);
                    names.extend(
                        bindings
                            .into_iter()
                            .map(|b| (b.name, ExportKind::Variable)),
                    );
                }
                names
            }
            _ => Vec::new(),
        }
    }

    fn record_import(&mut self, node: Node<'s>) {
        let line = line_of(node);
        let mut specifiers = Vec::new();
        let mut has_clause = false;
        let mut kind = ImportKind::Static;
        let mut source = node
            .child_by_field_name("source")
            .map(|s| self.string_value(s));

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_clause" => {
                    has_clause = true;
                    self.import_clause_specifiers(child, &mut specifiers);
                }
                "import_require_clause" => {
                    // `import x = require("y")`
                    has_clause = true;
                    kind = ImportKind::Require;
                    let mut inner = child.walk();
                    for part in child.named_children(&mut inner) {
                        match part.kind() {
                            "identifier" => {
                                specifiers.push(ImportSpecifier::default_binding(self.text(part)));
                            }
                            "string" => source = Some(self.string_value(part)),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        let Some(source) = source else { return };
        if !has_clause {
            kind = ImportKind::SideEffect;
        }
        self.imports.push(ImportInfo {
            source,
            specifiers,
            kind,
            line,
        });
    }

    fn import_clause_specifiers(&self, clause: Node<'s>, out: &mut Vec<ImportSpecifier>) {
        let mut cursor = clause.walk();
        for part in clause.named_children(&mut cursor) {
            match part.kind() {
                "identifier" => out.push(ImportSpecifier::default_binding(self.text(part))),
                "namespace_import" => {
                    let mut inner = part.walk();
                    if let Some(ident) = part.named_children(&mut inner).last() {
                        out.push(ImportSpecifier::namespace(self.text(ident)));
                    }
                }
                "named_imports" => {
                    let mut inner = part.walk();
                    for spec in part.named_children(&mut inner) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = self.module_export_name(name);
                        let local = spec
                            .child_by_field_name("alias")
                            .map_or_else(|| imported.clone(), |a| self.text(a).to_string());
                        out.push(ImportSpecifier::named(imported, local));
                    }
                }
                _ => {}
            }
        }
    }

    /// Dynamic `import("x")` and CommonJS `require("x")` with a literal argument
    fn record_call_import(&mut self, node: Node<'s>) {
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        let kind = match callee.kind() {
            "import" => ImportKind::Dynamic,
            "identifier" if self.text(callee) == "require" => ImportKind::Require,
            _ => return,
        };
        let Some(args) = node.child_by_field_name("arguments") else {
            return;
        };
        let mut cursor = args.walk();
        let Some(first) = args.named_children(&mut cursor).next() else {
            return;
        };
        let source = match first.kind() {
            "string" => self.string_value(first),
            "template_string" if !self.text(first).contains("${") => {
                self.text(first).trim_matches('`').to_string()
            }
            _ => return,
        };

        let mut specifiers = Vec::new();
        if kind == ImportKind::Require {
            if let Some(parent) = node.parent().filter(|p| p.kind() == "variable_declarator") {
                if let Some(pattern) = parent.child_by_field_name("name") {
                    if pattern.kind() == "identifier" {
                        specifiers.push(ImportSpecifier::default_binding(self.text(pattern)));
                    } else {
                        let mut bindings = Vec::new();
                        self.collect_bindings(pattern, false, false, &mut bindings);
                        specifiers.extend(
                            bindings
                                .into_iter()
                                .map(|b| ImportSpecifier::named(b.name.clone(), b.name)),
                        );
                    }
                }
            }
        }

        self.imports.push(ImportInfo {
            source,
            specifiers,
            kind,
            line: line_of(node),
        });
    }

    // ------------------------------------------------------------------
    // Text helpers
    // ------------------------------------------------------------------

    fn text(&self, node: Node<'s>) -> &'s str {
        node.utf8_text(self.source).unwrap_or_default()
    }

    fn field_text(&self, node: Node<'s>, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_string())
            .filter(|s| !s.is_empty())
    }

    fn string_value(&self, node: Node<'s>) -> String {
        strip_quotes(self.text(node)).to_string()
    }

    fn module_export_name(&self, node: Node<'s>) -> String {
        if node.kind() == "string" {
            self.string_value(node)
        } else {
            self.text(node).to_string()
        }
    }

    fn property_key(&self, key: Node<'s>) -> String {
        match key.kind() {
            "string" => self.string_value(key),
            "private_property_identifier" => self.text(key).trim_start_matches('#').to_string(),
            _ => self.text(key).to_string(),
        }
    }

    /// Last segment of an assignment target (`module.exports.run` → `run`)
    fn assignment_target(&self, left: Node<'s>) -> Option<String> {
        match left.kind() {
            "identifier" => Some(self.text(left).to_string()),
            "member_expression" => left
                .child_by_field_name("property")
                .map(|p| self.property_key(p)),
            "subscript_expression" => left
                .child_by_field_name("index")
                .filter(|i| i.kind() == "string")
                .map(|i| self.string_value(i)),
            _ => None,
        }
    }
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

fn strip_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'' | '`')), Some(close)) if open == close && trimmed.len() >= 2 => {
            &trimmed[1..trimmed.len() - 1]
        }
        _ => trimmed,
    }
}

fn declaration_kind(declarator: Node, source: &[u8]) -> DeclarationKind {
    let Some(parent) = declarator.parent() else {
        return DeclarationKind::Var;
    };
    if parent.kind() != "lexical_declaration" {
        return DeclarationKind::Var;
    }
    let keyword = parent
        .child_by_field_name("kind")
        .or_else(|| parent.child(0))
        .and_then(|k| k.utf8_text(source).ok());
    match keyword {
        Some("const") => DeclarationKind::Const,
        Some("let") => DeclarationKind::Let,
        _ => DeclarationKind::Var,
    }
}

#[cfg(test)]
mod tests {
    use super::strip_quotes;

    #[test]
    fn strip_quotes_handles_all_quote_styles() {
        assert_eq!(strip_quotes("'./a'"), "./a");
        assert_eq!(strip_quotes("\"./b\""), "./b");
        assert_eq!(strip_quotes("`./c`"), "./c");
        assert_eq!(strip_quotes("'"), "'");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
