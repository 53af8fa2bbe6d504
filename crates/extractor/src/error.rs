use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractorError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractorError {
    #[error("Unsupported language for AST parsing: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to load grammar: {0}")]
    Grammar(String),

    #[error("Syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Parser produced no tree")]
    NoTree,
}

impl ExtractorError {
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// 1-based position of a syntax error, if this is one
    #[must_use]
    pub const fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::Syntax { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}
