use crate::error::{ExtractorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source language tag attached to every analyzed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Tsx,
    Python,
    Ruby,
    Rust,
    Go,
    Java,
    Kotlin,
    Swift,
    C,
    Cpp,
    CSharp,
    Php,
    Unknown,
}

/// Comment syntax used when counting logical lines of code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//` line comments and `/* */` blocks
    CFamily,
    /// `#` line comments
    Hash,
    None,
}

/// Family of declaration syntax, used to pick heuristic patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxFamily {
    CurlyBrace,
    Indentation,
}

impl Language {
    /// Case-insensitive extension lookup, without the leading dot
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "mts" | "cts" => Self::TypeScript,
            "tsx" => Self::Tsx,
            "py" | "pyw" => Self::Python,
            "rb" => Self::Ruby,
            "rs" => Self::Rust,
            "go" => Self::Go,
            "java" => Self::Java,
            "kt" | "kts" => Self::Kotlin,
            "swift" => Self::Swift,
            "c" | "h" => Self::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Self::Cpp,
            "cs" => Self::CSharp,
            "php" => Self::Php,
            _ => Self::Unknown,
        }
    }

    /// Language of a path, by its final extension
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::Unknown, Self::from_extension)
    }

    /// Parse a language tag as produced by [`Language::as_str`], plus common aliases
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "javascript" | "js" | "jsx" => Self::JavaScript,
            "typescript" | "ts" => Self::TypeScript,
            "tsx" => Self::Tsx,
            "python" | "py" => Self::Python,
            "ruby" | "rb" => Self::Ruby,
            "rust" | "rs" => Self::Rust,
            "go" | "golang" => Self::Go,
            "java" => Self::Java,
            "kotlin" | "kt" => Self::Kotlin,
            "swift" => Self::Swift,
            "c" => Self::C,
            "cpp" | "c++" => Self::Cpp,
            "csharp" | "c#" | "cs" => Self::CSharp,
            "php" => Self::Php,
            _ => Self::Unknown,
        }
    }

    /// Stable lowercase tag, as stored in graph records
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Python => "python",
            Self::Ruby => "ruby",
            Self::Rust => "rust",
            Self::Go => "go",
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::Swift => "swift",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::Php => "php",
            Self::Unknown => "unknown",
        }
    }

    /// Check if this language is extracted from a full grammar
    pub const fn supports_ast(self) -> bool {
        matches!(self, Self::JavaScript | Self::TypeScript | Self::Tsx)
    }

    /// Grammar for the AST path; errors for heuristic-only languages
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Self::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Self::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Self::Tsx => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
            _ => Err(ExtractorError::unsupported_language(self.as_str())),
        }
    }

    pub const fn comment_style(self) -> CommentStyle {
        match self {
            Self::JavaScript
            | Self::TypeScript
            | Self::Tsx
            | Self::Rust
            | Self::Go
            | Self::Java
            | Self::Kotlin
            | Self::Swift
            | Self::C
            | Self::Cpp
            | Self::CSharp
            | Self::Php => CommentStyle::CFamily,
            Self::Python | Self::Ruby => CommentStyle::Hash,
            Self::Unknown => CommentStyle::None,
        }
    }

    pub const fn syntax_family(self) -> SyntaxFamily {
        match self {
            Self::Python | Self::Ruby => SyntaxFamily::Indentation,
            _ => SyntaxFamily::CurlyBrace,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{CommentStyle, Language, SyntaxFamily};

    #[test]
    fn paths_map_to_languages() {
        let cases = [
            ("src/app.js", Language::JavaScript),
            ("src/legacy.JSX", Language::JavaScript),
            ("lib/esm.mjs", Language::JavaScript),
            ("src/index.ts", Language::TypeScript),
            ("web/App.tsx", Language::Tsx),
            ("tools/gen.py", Language::Python),
            ("cmd/server.go", Language::Go),
            ("include/vec.hpp", Language::Cpp),
            ("Makefile", Language::Unknown),
            ("README.md", Language::Unknown),
        ];
        for (path, expected) in cases {
            assert_eq!(Language::from_path(path), expected, "{path}");
        }
    }

    #[test]
    fn tags_round_trip_through_as_str() {
        for lang in [
            Language::JavaScript,
            Language::TypeScript,
            Language::Tsx,
            Language::Python,
            Language::CSharp,
            Language::Unknown,
        ] {
            assert_eq!(Language::from_tag(lang.as_str()), lang);
        }
        assert_eq!(Language::from_tag("JS"), Language::JavaScript);
        assert_eq!(Language::from_tag("c#"), Language::CSharp);
    }

    #[test]
    fn only_js_family_has_a_grammar() {
        for lang in [Language::JavaScript, Language::TypeScript, Language::Tsx] {
            assert!(lang.supports_ast());
            assert!(lang.tree_sitter_language().is_ok());
        }
        for lang in [Language::Python, Language::Go, Language::Unknown] {
            assert!(!lang.supports_ast());
            assert!(lang.tree_sitter_language().is_err());
        }
    }

    #[test]
    fn comment_style_and_syntax_family() {
        assert_eq!(Language::Python.comment_style(), CommentStyle::Hash);
        assert_eq!(Language::Go.comment_style(), CommentStyle::CFamily);
        assert_eq!(Language::Ruby.syntax_family(), SyntaxFamily::Indentation);
        assert_eq!(Language::Java.syntax_family(), SyntaxFamily::CurlyBrace);
    }
}
