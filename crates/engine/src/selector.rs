use crate::config::EngineConfig;
use crate::grammar::decode_relevance;
use crate::oracle::OracleGate;
use nodepatch_markup_index::{MarkupNode, NodeFlag};
use nodepatch_protocol::{CandidateNode, FileSummary, RelevanceRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The selector's verdict for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceDecision {
    pub is_relevant: bool,
    pub score: u8,
    pub reasoning: String,
    /// Always a subset of the file's node ids
    pub target_node_ids: Vec<String>,
}

impl RelevanceDecision {
    pub fn not_relevant(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    /// Relevant, at or above the threshold, and naming at least one target
    pub fn is_accepted(&self, threshold: u8) -> bool {
        self.is_relevant && self.score >= threshold && !self.target_node_ids.is_empty()
    }
}

/// Build the compact file description sent to the oracle
pub fn describe_file(
    request: &str,
    file_path: &str,
    component_name: Option<&str>,
    nodes: &[MarkupNode],
    config: &EngineConfig,
) -> RelevanceRequest {
    let candidate_nodes: Vec<CandidateNode> = nodes
        .iter()
        .take(config.max_candidate_nodes)
        .map(|node| CandidateNode {
            id: node.id.clone(),
            tag: node.tag.clone(),
            text_preview: node.text_preview(config.preview_chars),
            flags: node.flags.iter().map(|f| f.as_str().to_string()).collect(),
            attributes: node.attributes.clone(),
        })
        .collect();

    let summary = FileSummary {
        component_name: component_name.map(str::to_string),
        has_actionable_controls: nodes.iter().any(|n| n.has_flag(NodeFlag::ActionableControl)),
        node_count: nodes.len(),
        candidates_truncated: nodes.len() > candidate_nodes.len(),
    };

    RelevanceRequest::new(request, file_path, summary, candidate_nodes)
}

/// Ask the oracle which nodes of a file must change
///
/// Oracle failures resolve to "not relevant"; unknown target ids are dropped.
pub async fn select_targets(
    gate: &OracleGate,
    request: &str,
    file_path: &str,
    component_name: Option<&str>,
    nodes: &[MarkupNode],
    config: &EngineConfig,
) -> RelevanceDecision {
    let description = describe_file(request, file_path, component_name, nodes, config);
    let raw = match gate.assess_relevance(&description).await {
        Ok(raw) => raw,
        Err(e) => return RelevanceDecision::not_relevant(format!("oracle failure: {e}")),
    };
    decision_from_response(&raw, nodes)
}

/// Decode a raw `relevance/v1` answer against the file's node ids
pub fn decision_from_response(raw: &str, nodes: &[MarkupNode]) -> RelevanceDecision {
    let answer = decode_relevance(raw);
    let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    let (target_node_ids, unknown): (Vec<String>, Vec<String>) = answer
        .targets
        .into_iter()
        .partition(|id| known.contains(id.as_str()));
    if !unknown.is_empty() {
        log::debug!("Dropping unknown target ids: {}", unknown.join(", "));
    }

    RelevanceDecision {
        is_relevant: answer.is_relevant,
        score: answer.score,
        reasoning: answer.reasoning,
        target_node_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodepatch_markup_index::{index_source, IndexerConfig};

    const PAGE: &str = "export default function Page() {\n  return (\n    <main>\n      <h1>Welcome back to the dashboard of your very own company account</h1>\n      <button onClick={go}>Sign In</button>\n    </main>\n  );\n}\n";

    fn nodes() -> Vec<MarkupNode> {
        index_source("src/Page.jsx", PAGE, &IndexerConfig::default())
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut decision = RelevanceDecision {
            is_relevant: true,
            score: 69,
            reasoning: String::new(),
            target_node_ids: vec!["node_1".into()],
        };
        assert!(!decision.is_accepted(70));
        decision.score = 70;
        assert!(decision.is_accepted(70));
        decision.target_node_ids.clear();
        assert!(!decision.is_accepted(70));
    }

    #[test]
    fn description_is_compact() {
        let config = EngineConfig {
            max_candidate_nodes: 2,
            preview_chars: 10,
            ..Default::default()
        };
        let request = describe_file("make it red", "src/Page.jsx", Some("Page"), &nodes(), &config);

        assert_eq!(request.candidate_nodes.len(), 2);
        assert_eq!(request.candidate_nodes[1].tag, "h1");
        assert!(request.candidate_nodes[1].text_preview.chars().count() <= 11);
        assert!(request.summary.has_actionable_controls);
        assert_eq!(request.summary.node_count, 3);
        assert!(request.summary.candidates_truncated);
        assert_eq!(request.summary.component_name.as_deref(), Some("Page"));
    }

    #[test]
    fn unknown_targets_are_dropped() {
        let decision = decision_from_response("RELEVANT: YES\nSCORE: 88\nREASON: ok\nTARGETS: node_3, node_42", &nodes());
        assert_eq!(decision.target_node_ids, vec!["node_3"]);
        assert!(decision.is_accepted(70));
    }
}
