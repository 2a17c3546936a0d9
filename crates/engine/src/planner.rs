use crate::grammar::decode_edit_map;
use crate::oracle::OracleGate;
use nodepatch_markup_index::{MarkupNode, StructuralFingerprint};
use nodepatch_protocol::{FileContext, LineSpan, PatchRequest, SelectedNode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Replacement text for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEdit {
    pub node_id: String,
    pub replacement_text: String,
    /// Import lines the oracle says the replacement needs; surfaced, never applied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_imports: Vec<String>,
}

impl NodeEdit {
    pub fn new(node_id: impl Into<String>, replacement_text: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            replacement_text: replacement_text.into(),
            required_imports: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchPlan {
    pub edits: Vec<NodeEdit>,
    /// De-duplicated required-import hints across all edits
    pub follow_ups: Vec<String>,
}

impl PatchPlan {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Drop every target that is an ancestor of another target
///
/// The result keeps the input order.
pub fn prune_nested_targets(nodes: &[MarkupNode], target_ids: &[String]) -> Vec<String> {
    let parents: HashMap<&str, Option<&str>> = nodes
        .iter()
        .map(|n| (n.id.as_str(), n.parent_id.as_deref()))
        .collect();
    let targets: HashSet<&str> = target_ids.iter().map(String::as_str).collect();

    let mut ancestors: HashSet<&str> = HashSet::new();
    for id in &targets {
        let mut current = parents.get(id).copied().flatten();
        while let Some(parent) = current {
            if targets.contains(parent) {
                ancestors.insert(parent);
            }
            current = parents.get(parent).copied().flatten();
        }
    }

    for id in &ancestors {
        log::debug!("Pruning {id}: a descendant is also targeted");
    }
    target_ids
        .iter()
        .filter(|id| !ancestors.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Build the `patch/v1` request for the selected nodes of one file
pub fn build_patch_request(
    request: &str,
    file_path: &str,
    fingerprint: &StructuralFingerprint,
    line_count: usize,
    selected: &[&MarkupNode],
) -> PatchRequest {
    let file_context = FileContext {
        file_path: file_path.to_string(),
        component_name: fingerprint.primary_identifier.clone(),
        imports: fingerprint.imports.clone(),
        line_count,
    };
    let selected_nodes = selected
        .iter()
        .map(|node| SelectedNode {
            id: node.id.clone(),
            tag: node.tag.clone(),
            span: LineSpan {
                start_line: node.span.start_line,
                end_line: node.span.end_line,
            },
            code_snippet: node.code_snippet.clone(),
            context: node.context.clone(),
        })
        .collect();
    PatchRequest::new(request, file_context, selected_nodes)
}

/// One oracle exchange for all selected nodes of a file
///
/// Oracle failures and unparsable answers produce an empty plan.
pub async fn plan(gate: &OracleGate, request: &PatchRequest) -> PatchPlan {
    match gate.propose_edits(request).await {
        Ok(raw) => plan_from_response(&raw, request),
        Err(e) => {
            log::warn!("No edits for {}: {e}", request.file_context.file_path);
            PatchPlan::default()
        }
    }
}

/// Decode a raw `patch/v1` answer, keeping only ids that were asked for
pub fn plan_from_response(raw: &str, request: &PatchRequest) -> PatchPlan {
    let asked: HashSet<&str> = request.selected_nodes.iter().map(|n| n.id.as_str()).collect();
    let mut plan = PatchPlan::default();

    for (node_id, value) in decode_edit_map(raw) {
        if !asked.contains(node_id.as_str()) {
            log::debug!("Ignoring edit for unrequested node {node_id}");
            continue;
        }
        for import in value.required_imports() {
            log::info!("{} needs import for {node_id}: {import}", request.file_context.file_path);
            if !plan.follow_ups.contains(import) {
                plan.follow_ups.push(import.clone());
            }
        }
        plan.edits.push(NodeEdit {
            node_id,
            replacement_text: value.code().to_string(),
            required_imports: value.required_imports().to_vec(),
        });
    }

    let declined = asked.len().saturating_sub(plan.edits.len());
    if declined > 0 {
        log::debug!("{declined} selected node(s) declined by the oracle");
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodepatch_markup_index::{index_source, IndexerConfig};
    use pretty_assertions::assert_eq;

    const CARD: &str = "export const Card = () => (\n  <div className=\"card\">\n    <header>\n      <h2>Title</h2>\n    </header>\n    <p>Body</p>\n  </div>\n);\n";

    fn nodes() -> Vec<MarkupNode> {
        index_source("Card.jsx", CARD, &IndexerConfig::default())
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ancestors_of_targets_are_pruned() {
        // node_1 div > node_2 header > node_3 h2, node_4 p
        let nodes = nodes();
        assert_eq!(prune_nested_targets(&nodes, &ids(&["node_1", "node_3"])), ids(&["node_3"]));
        assert_eq!(
            prune_nested_targets(&nodes, &ids(&["node_2", "node_4", "node_3"])),
            ids(&["node_4", "node_3"])
        );
        assert_eq!(prune_nested_targets(&nodes, &ids(&["node_2", "node_4"])), ids(&["node_2", "node_4"]));
    }

    #[test]
    fn request_carries_snippets_and_context() {
        let nodes = nodes();
        let fp = StructuralFingerprint::extract(CARD);
        let request = build_patch_request("bold title", "Card.jsx", &fp, 9, &[&nodes[2]]);

        assert_eq!(request.grammar, "patch/v1");
        assert_eq!(request.file_context.component_name.as_deref(), Some("Card"));
        assert_eq!(request.selected_nodes[0].code_snippet, "      <h2>Title</h2>");
        assert_eq!(
            request.selected_nodes[0].span,
            LineSpan {
                start_line: 4,
                end_line: 4
            }
        );
    }

    #[test]
    fn plan_keeps_requested_ids_and_collects_follow_ups() {
        let nodes = nodes();
        let fp = StructuralFingerprint::extract(CARD);
        let request = build_patch_request("x", "Card.jsx", &fp, 9, &[&nodes[2], &nodes[3]]);

        let raw = r#"```json
{"node_3": {"modifiedCode": "      <Heading>Title</Heading>", "requiredImports": ["import Heading from './Heading';"]},
 "node_9": "<nope/>"}
```"#;
        let plan = plan_from_response(raw, &request);
        assert_eq!(plan.edits.len(), 1);
        assert_eq!(plan.edits[0].node_id, "node_3");
        assert_eq!(plan.follow_ups, vec!["import Heading from './Heading';"]);
    }

    #[test]
    fn unparsable_answer_is_empty_plan() {
        let nodes = nodes();
        let fp = StructuralFingerprint::extract(CARD);
        let request = build_patch_request("x", "Card.jsx", &fp, 9, &[&nodes[3]]);
        assert!(plan_from_response("I would rather not.", &request).is_empty());
    }
}
