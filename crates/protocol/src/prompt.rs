//! Prompt rendering for both oracle exchanges
//!
//! The system prompt pins the response grammar; the user prompt carries the
//! request payload as pretty JSON so transports can forward it unchanged.

use crate::{serialize_json, PatchRequest, RelevanceRequest, PATCH_GRAMMAR, RELEVANCE_GRAMMAR};
use anyhow::Result;

pub const RELEVANCE_SYSTEM_PROMPT: &str = "\
You decide whether a source file must change to satisfy a request.
The file is described by a list of markup nodes (id, tag, text preview, flags, attributes).
Answer using exactly these lines and nothing else:
RELEVANT: YES or NO
SCORE: an integer from 0 to 100
REASON: one sentence
TARGETS: comma separated node ids that must change (omit when not relevant)";

pub const PATCH_SYSTEM_PROMPT: &str = "\
You rewrite markup nodes of a source file to satisfy a request.
Reply with a single JSON object mapping node id to its replacement.
A replacement is either the new text as a string, or an object
{\"modifiedCode\": \"...\", \"requiredImports\": [\"...\"]}.
A replacement stands in for the node's whole codeSnippet lines: reproduce every
line of codeSnippet, including any code before or after the element on those
lines, changing only what the request needs. Keep indentation.
Omit nodes that do not need to change. Never add nodes that were not listed.";

/// Render the user prompt for a relevance exchange
pub fn render_relevance_prompt(request: &RelevanceRequest) -> Result<String> {
    Ok(format!(
        "GRAMMAR: {RELEVANCE_GRAMMAR}\nREQUEST: {}\nFILE: {}\n\n{}",
        request.natural_language_request,
        request.file_path,
        serialize_json(request)?
    ))
}

/// Render the user prompt for a patch exchange
pub fn render_patch_prompt(request: &PatchRequest) -> Result<String> {
    Ok(format!(
        "GRAMMAR: {PATCH_GRAMMAR}\nREQUEST: {}\nFILE: {}\n\n{}",
        request.natural_language_request,
        request.file_context.file_path,
        serialize_json(request)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileContext, FileSummary, LineSpan, SelectedNode};

    #[test]
    fn relevance_prompt_carries_header_and_payload() {
        let request = RelevanceRequest::new("hide the footer", "src/App.jsx", FileSummary::default(), Vec::new());
        let prompt = render_relevance_prompt(&request).unwrap();
        assert!(prompt.starts_with("GRAMMAR: relevance/v1\nREQUEST: hide the footer\nFILE: src/App.jsx"));
        assert!(prompt.contains("\"candidateNodes\": []"));
    }

    #[test]
    fn patch_prompt_embeds_snippets() {
        let request = PatchRequest::new(
            "rename the button",
            FileContext {
                file_path: "src/App.jsx".into(),
                component_name: Some("App".into()),
                imports: vec!["import React from 'react';".into()],
                line_count: 10,
            },
            vec![SelectedNode {
                id: "node_3".into(),
                tag: "button".into(),
                span: LineSpan {
                    start_line: 7,
                    end_line: 7,
                },
                code_snippet: "<button>Go</button>".into(),
                context: String::new(),
            }],
        );
        let prompt = render_patch_prompt(&request).unwrap();
        assert!(prompt.starts_with("GRAMMAR: patch/v1"));
        assert!(prompt.contains("<button>Go</button>"));
        assert!(PATCH_SYSTEM_PROMPT.contains("modifiedCode"));
    }

    #[test]
    fn patch_prompt_asks_for_whole_snippet_lines() {
        let node = SelectedNode {
            id: "node_1".into(),
            tag: "b".into(),
            span: LineSpan {
                start_line: 3,
                end_line: 3,
            },
            code_snippet: "export const Tag = () => <b />;".into(),
            context: String::new(),
        };
        let payload = serde_json::to_value(&node).unwrap();
        assert!(payload.get("codeSnippet").is_some());
        assert!(PATCH_SYSTEM_PROMPT.contains("whole codeSnippet lines"));
        assert!(PATCH_SYSTEM_PROMPT.contains("before or after the element"));
    }
}
