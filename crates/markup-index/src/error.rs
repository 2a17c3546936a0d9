use thiserror::Error;

/// Result type for indexing operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur while building a markup index
///
/// These never escape [`crate::MarkupIndexer::index`]; a failed parse is
/// reported as an empty node list. They are surfaced by
/// [`crate::MarkupIndexer::try_index`] so callers can record a reason.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Source contains syntax errors
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No markup-aware grammar for this file type
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl IndexError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
