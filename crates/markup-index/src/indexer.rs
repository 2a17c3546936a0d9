use crate::config::IndexerConfig;
use crate::error::{IndexError, Result};
use crate::flags::compute_flags;
use crate::language::Language;
use crate::types::{MarkupNode, Span, UNKNOWN_TAG};
use std::path::Path;
use tree_sitter::{Node, Parser};

const ELEMENT_KIND: &str = "jsx_element";
const SELF_CLOSING_KIND: &str = "jsx_self_closing_element";

/// Tree-sitter based indexer that turns a source buffer into markup nodes
pub struct MarkupIndexer {
    config: IndexerConfig,
    parser: Parser,
    language: Language,
}

impl MarkupIndexer {
    /// Create indexer for a language with default configuration
    pub fn new(language: Language) -> Result<Self> {
        Self::with_config(IndexerConfig::default(), language)
    }

    /// Create indexer for the language implied by a file path
    pub fn for_path(path: impl AsRef<Path>, config: IndexerConfig) -> Result<Self> {
        Self::with_config(config, Language::from_path(path))
    }

    pub fn with_config(config: IndexerConfig, language: Language) -> Result<Self> {
        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| IndexError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self {
            config,
            parser,
            language,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Index a buffer, failing closed
    ///
    /// Any parse failure yields an empty list; the caller treats the file as
    /// non-indexable.
    pub fn index(&mut self, content: &str) -> Vec<MarkupNode> {
        match self.try_index(content) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::debug!("Markup index unavailable: {e}");
                Vec::new()
            }
        }
    }

    /// Index a buffer, reporting why indexing failed
    pub fn try_index(&mut self, content: &str) -> Result<Vec<MarkupNode>> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| IndexError::parse("Failed to parse source code"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(IndexError::parse(format!(
                "syntax error near line {}",
                first_error_line(root).unwrap_or(1)
            )));
        }

        let lines: Vec<&str> = content.split('\n').collect();
        let mut nodes = Vec::new();

        // Preorder walk; children are pushed in reverse so they pop in document order.
        let mut stack: Vec<(Node, Option<String>)> = vec![(root, None)];
        while let Some((node, parent_id)) = stack.pop() {
            let mut child_parent = parent_id.clone();

            if let Some(name) = element_name(node) {
                let id = format!("node_{}", nodes.len() + 1);
                let markup = self.build_node(content, &lines, node, name, &id, parent_id);
                nodes.push(markup);
                child_parent = Some(id);
            }

            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            for child in children.into_iter().rev() {
                stack.push((child, child_parent.clone()));
            }
        }

        Ok(nodes)
    }

    fn build_node(
        &self,
        content: &str,
        lines: &[&str],
        node: Node,
        name: Node,
        id: &str,
        parent_id: Option<String>,
    ) -> MarkupNode {
        let start = node.start_position();
        let end = node.end_position();
        let span = Span {
            start_line: start.row + 1,
            end_line: end.row + 1,
            start_column: start.column,
            end_column: end.column,
        };

        let tag = resolve_tag(content, name);
        let attributes = extract_attributes(content, node);
        let text_content = extract_text(content, node);
        let flags = compute_flags(&tag, &text_content, &attributes);

        MarkupNode {
            id: id.to_string(),
            tag,
            text_content,
            span,
            code_snippet: slice_lines(lines, span.start_line, span.end_line),
            context: self.context_window(lines, span),
            attributes,
            flags,
            depth: markup_depth(node),
            parent_id,
        }
    }

    /// The span plus up to `context_lines` lines on each side
    fn context_window(&self, lines: &[&str], span: Span) -> String {
        let first = span.start_line.saturating_sub(self.config.context_lines).max(1);
        let last = (span.end_line + self.config.context_lines).min(lines.len());
        slice_lines(lines, first, last)
    }
}

/// Index a file's content using the grammar implied by its path
///
/// Unsupported file types and parse failures produce an empty list.
pub fn index_source(path: impl AsRef<Path>, content: &str, config: &IndexerConfig) -> Vec<MarkupNode> {
    match MarkupIndexer::for_path(path, config.clone()) {
        Ok(mut indexer) => indexer.index(content),
        Err(e) => {
            log::debug!("No markup indexer: {e}");
            Vec::new()
        }
    }
}

/// `lines[start-1 ..= end-1]` joined by newline (1-indexed, clamped)
pub fn slice_lines(lines: &[&str], start_line: usize, end_line: usize) -> String {
    if lines.is_empty() || start_line == 0 || start_line > end_line {
        return String::new();
    }
    let from = (start_line - 1).min(lines.len());
    let to = end_line.min(lines.len());
    lines[from..to].join("\n")
}

/// Name node of an indexable element; fragments have none
fn element_name(node: Node) -> Option<Node> {
    match node.kind() {
        ELEMENT_KIND => node
            .child_by_field_name("open_tag")
            .and_then(|open| open.child_by_field_name("name")),
        SELF_CLOSING_KIND => node.child_by_field_name("name"),
        _ => None,
    }
}

fn resolve_tag(content: &str, name: Node) -> String {
    let resolvable = matches!(
        name.kind(),
        "identifier" | "member_expression" | "jsx_namespace_name" | "nested_identifier"
    );
    let text = content[name.start_byte()..name.end_byte()].trim();
    if resolvable && !text.is_empty() {
        text.to_string()
    } else {
        UNKNOWN_TAG.to_string()
    }
}

fn extract_attributes(content: &str, node: Node) -> Vec<String> {
    let tag_node = if node.kind() == ELEMENT_KIND {
        match node.child_by_field_name("open_tag") {
            Some(open) => open,
            None => return Vec::new(),
        }
    } else {
        node
    };

    let mut cursor = tag_node.walk();
    tag_node
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "jsx_attribute")
        .filter_map(|attr| attr.named_child(0))
        .map(|name| content[name.start_byte()..name.end_byte()].to_string())
        .collect()
}

fn extract_text(content: &str, node: Node) -> String {
    if node.kind() != ELEMENT_KIND {
        return String::new();
    }
    let mut cursor = node.walk();
    let parts: Vec<&str> = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "jsx_text")
        .map(|text| content[text.start_byte()..text.end_byte()].trim())
        .filter(|text| !text.is_empty())
        .collect();
    parts.join(" ")
}

/// Count markup-element ancestors by walking parent links to the root
fn markup_depth(node: Node) -> usize {
    let mut depth = 0;
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if element_name(ancestor).is_some() {
            depth += 1;
        }
        current = ancestor.parent();
    }
    depth
}

fn first_error_line(root: Node) -> Option<usize> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev().filter(|c| c.has_error()));
    }
    None
}
