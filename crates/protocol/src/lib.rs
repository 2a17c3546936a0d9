use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod prompt;

pub use prompt::{render_patch_prompt, render_relevance_prompt, PATCH_SYSTEM_PROMPT, RELEVANCE_SYSTEM_PROMPT};

/// Line-oriented relevance grammar: `RELEVANT`, `SCORE`, `REASON`, `TARGETS`
pub const RELEVANCE_GRAMMAR: &str = "relevance/v1";

/// JSON edit-map grammar: node id -> string | `{modifiedCode, requiredImports?}`
pub const PATCH_GRAMMAR: &str = "patch/v1";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateNode {
    pub id: String,
    pub tag: String,
    pub text_preview: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub component_name: Option<String>,
    pub has_actionable_controls: bool,
    pub node_count: usize,
    /// Set when only a prefix of the file's nodes is listed as candidates
    #[serde(default)]
    pub candidates_truncated: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceRequest {
    pub grammar: String,
    pub natural_language_request: String,
    pub file_path: String,
    pub summary: FileSummary,
    pub candidate_nodes: Vec<CandidateNode>,
}

impl RelevanceRequest {
    pub fn new(
        natural_language_request: impl Into<String>,
        file_path: impl Into<String>,
        summary: FileSummary,
        candidate_nodes: Vec<CandidateNode>,
    ) -> Self {
        Self {
            grammar: RELEVANCE_GRAMMAR.to_string(),
            natural_language_request: natural_language_request.into(),
            file_path: file_path.into(),
            summary,
            candidate_nodes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineSpan {
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedNode {
    pub id: String,
    pub tag: String,
    pub span: LineSpan,
    pub code_snippet: String,
    /// Surrounding lines for orientation only; replacements cover `code_snippet`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileContext {
    pub file_path: String,
    pub component_name: Option<String>,
    #[serde(default)]
    pub imports: Vec<String>,
    pub line_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    pub grammar: String,
    pub natural_language_request: String,
    pub file_context: FileContext,
    pub selected_nodes: Vec<SelectedNode>,
}

impl PatchRequest {
    pub fn new(
        natural_language_request: impl Into<String>,
        file_context: FileContext,
        selected_nodes: Vec<SelectedNode>,
    ) -> Self {
        Self {
            grammar: PATCH_GRAMMAR.to_string(),
            natural_language_request: natural_language_request.into(),
            file_context,
            selected_nodes,
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn relevance_request_uses_camel_case_and_grammar_tag() {
        let request = RelevanceRequest::new(
            "make the sign in button blue",
            "src/Login.jsx",
            FileSummary {
                component_name: Some("Login".into()),
                has_actionable_controls: true,
                node_count: 1,
                candidates_truncated: false,
            },
            vec![CandidateNode {
                id: "node_1".into(),
                tag: "button".into(),
                text_preview: "Sign In".into(),
                flags: vec!["actionable_control".into()],
                attributes: vec!["onClick".into()],
            }],
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["grammar"], "relevance/v1");
        assert_eq!(value["naturalLanguageRequest"], "make the sign in button blue");
        assert_eq!(value["summary"]["hasActionableControls"], true);
        assert_eq!(value["candidateNodes"][0]["textPreview"], "Sign In");
    }

    #[test]
    fn selected_node_omits_empty_context() {
        let node = SelectedNode {
            id: "node_2".into(),
            tag: "p".into(),
            span: LineSpan {
                start_line: 4,
                end_line: 4,
            },
            code_snippet: "<p>hi</p>".into(),
            context: String::new(),
        };
        let raw = serialize_json(&node).unwrap();
        assert!(!raw.contains("context"));
        assert!(raw.contains("\"startLine\": 4"));
    }
}
