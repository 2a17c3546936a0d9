//! Structural fingerprint of a source file
//!
//! Captured once before patching and compared against the patched buffer.
//! Extraction is line-based on purpose: a fingerprint must be obtainable even
//! from a buffer the parser rejects.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DEFAULT_NAMED_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*export\s+default\s+(?:async\s+)?(?:function\s*\*?|class)\s+([A-Za-z_$][\w$]*)")
        .expect("valid regex")
});

static DEFAULT_IDENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*export\s+default\s+([A-Za-z_$][\w$]*)\s*;?\s*$").expect("valid regex")
});

static COMPONENT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?(?:async\s+)?(?:function|class|const|let|var)\s+([A-Z][\w$]*)")
        .expect("valid regex")
});

static DEFAULT_EXPORT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bexport\s+default\b|\bexport\s*\{[^}]*\bas\s+default\b").expect("valid regex")
});

/// Keywords that can follow `export default` without naming a binding
const NON_IDENTIFIERS: &[&str] = &["function", "class", "async", "new", "await", "typeof"];

/// Pre-patch snapshot of a file's declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructuralFingerprint {
    /// Raw import lines, trimmed, in source order
    pub imports: Vec<String>,
    /// Raw export lines, trimmed, in source order
    pub exports: Vec<String>,
    /// Primary declared identifier (usually the component name)
    pub primary_identifier: Option<String>,
    pub has_default_export: bool,
}

impl StructuralFingerprint {
    /// Extract a fingerprint from a source buffer
    pub fn extract(content: &str) -> Self {
        let mut imports = Vec::new();
        let mut exports = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if starts_with_keyword(trimmed, "import") {
                imports.push(trimmed.to_string());
            } else if starts_with_keyword(trimmed, "export") {
                exports.push(trimmed.to_string());
            }
        }

        Self {
            imports,
            exports,
            primary_identifier: primary_identifier(content),
            has_default_export: has_default_export(content),
        }
    }

    /// All captured declaration lines, imports first
    pub fn declaration_lines(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().chain(self.exports.iter()).map(String::as_str)
    }
}

/// Resolve the primary declared identifier of a module
pub fn primary_identifier(content: &str) -> Option<String> {
    if let Some(caps) = DEFAULT_NAMED_DECL.captures(content) {
        return Some(caps[1].to_string());
    }
    if let Some(name) = DEFAULT_IDENT
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .find(|name| !NON_IDENTIFIERS.contains(&name.as_str()))
    {
        return Some(name);
    }
    COMPONENT_DECL
        .captures(content)
        .map(|caps| caps[1].to_string())
}

/// Whether the module has a default export in any supported form
pub fn has_default_export(content: &str) -> bool {
    DEFAULT_EXPORT_MARKER.is_match(content)
}

fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.strip_prefix(keyword).is_some_and(|rest| {
        rest.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '*' || c == '\'' || c == '"')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_imports_and_exports() {
        let code = r#"import React from 'react';
import { useState } from "react";
import './styles.css';

export const VERSION = 2;
function Header() { return null; }
export default Header;
"#;
        let fp = StructuralFingerprint::extract(code);
        assert_eq!(
            fp.imports,
            vec![
                "import React from 'react';",
                "import { useState } from \"react\";",
                "import './styles.css';",
            ]
        );
        assert_eq!(fp.exports, vec!["export const VERSION = 2;", "export default Header;"]);
        assert_eq!(fp.primary_identifier.as_deref(), Some("Header"));
        assert!(fp.has_default_export);
    }

    #[test]
    fn test_default_function_declaration_wins() {
        let code = "const Helper = 1;\nexport default function Dashboard() {}\n";
        assert_eq!(primary_identifier(code).as_deref(), Some("Dashboard"));
    }

    #[test]
    fn test_anonymous_default_falls_back_to_component() {
        let code = "const Card = () => null;\nexport default function () {}\n";
        assert_eq!(primary_identifier(code).as_deref(), Some("Card"));
    }

    #[test]
    fn test_named_default_reexport() {
        assert!(has_default_export("export { Page as default };"));
        assert!(!has_default_export("export const defaultTheme = {};"));
    }

    #[test]
    fn test_importer_identifier_is_not_an_import() {
        let fp = StructuralFingerprint::extract("const importer = load();\nexporter();\n");
        assert!(fp.imports.is_empty());
        assert!(fp.exports.is_empty());
        assert_eq!(fp.primary_identifier, None);
    }
}
