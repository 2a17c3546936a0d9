use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Tag reported when an element name cannot be resolved statically
pub const UNKNOWN_TAG: &str = "unknown";

/// Source region occupied by a node
///
/// Lines are 1-indexed and inclusive; columns are 0-indexed byte offsets as
/// reported by the parser.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl Span {
    /// Number of lines covered by this span
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Whether the two spans share at least one line
    #[must_use]
    pub const fn overlaps_lines(&self, other: &Span) -> bool {
        self.start_line <= other.end_line && other.start_line <= self.end_line
    }

    /// Check if span contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_line, self.end_line)
    }
}

/// Advisory predicates computed once per node at index time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeFlag {
    /// Button, link, or any element with a click handler
    ActionableControl,
    /// Mentions sign in/out, login, password and similar terms
    AuthTerm,
    /// Input-like element
    FormField,
    /// Navigation container or router link
    Navigation,
    Heading,
    Image,
}

impl NodeFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeFlag::ActionableControl => "actionable_control",
            NodeFlag::AuthTerm => "auth_term",
            NodeFlag::FormField => "form_field",
            NodeFlag::Navigation => "navigation",
            NodeFlag::Heading => "heading",
            NodeFlag::Image => "image",
        }
    }
}

impl fmt::Display for NodeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a file's markup tree
///
/// Nodes are immutable snapshots of the buffer they were indexed from. After
/// any edit to the buffer the index must be rebuilt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkupNode {
    /// Session-local identifier (`node_1`, `node_2`, ...)
    pub id: String,

    /// Element name, or [`UNKNOWN_TAG`]
    pub tag: String,

    /// Literal text children, trimmed and joined by a single space
    pub text_content: String,

    pub span: Span,

    /// Exact source lines covered by `span`
    pub code_snippet: String,

    /// Surrounding lines for disambiguation only; never patched
    pub context: String,

    /// Attribute names on the opening tag, in source order
    pub attributes: Vec<String>,

    #[serde(default)]
    pub flags: BTreeSet<NodeFlag>,

    /// Number of markup-element ancestors
    pub depth: usize,

    /// Id of the nearest markup-element ancestor
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl MarkupNode {
    /// Check whether a flag was computed for this node
    #[must_use]
    pub fn has_flag(&self, flag: NodeFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Text preview bounded to `max_chars` characters
    #[must_use]
    pub fn text_preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.text_content.chars().take(max_chars).collect();
        if self.text_content.chars().count() > max_chars {
            preview.push('…');
        }
        preview
    }
}
