use crate::error::{IndexError, Result};
use std::path::Path;

/// Source dialect of a file that may embed markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// JavaScript with JSX (`.js`, `.jsx`, `.mjs`, `.cjs`)
    JavaScript,
    /// TypeScript with JSX (`.tsx`)
    Tsx,
    /// Plain TypeScript (`.ts`, `.mts`, `.cts`); cannot contain markup
    TypeScript,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "tsx" => Language::Tsx,
            "ts" | "mts" | "cts" => Language::TypeScript,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Tsx => "tsx",
            Language::TypeScript => "typescript",
            Language::Unknown => "unknown",
        }
    }

    /// Whether files in this language can carry a markup tree
    pub fn supports_markup(self) -> bool {
        matches!(self, Language::JavaScript | Language::Tsx)
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Language::Tsx => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Unknown => Err(IndexError::unsupported_language(self.as_str())),
        }
    }
}
