use nodepatch_engine::{OutcomeStatus, PatchOutcome, SessionReport};
use nodepatch_markup_index::MarkupNode;

const PREVIEW_CHARS: usize = 60;

pub fn render_nodes(file: &str, nodes: &[MarkupNode]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{file}: {} markup node(s)\n", nodes.len()));
    for node in nodes {
        let indent = "  ".repeat(node.depth + 1);
        let mut line = format!("{indent}{} <{}> lines {}", node.id, node.tag, node.span);
        let preview = node.text_preview(PREVIEW_CHARS);
        if !preview.is_empty() {
            line.push_str(&format!(" \"{preview}\""));
        }
        if !node.flags.is_empty() {
            let flags: Vec<&str> = node.flags.iter().map(|f| f.as_str()).collect();
            line.push_str(&format!(" [{}]", flags.join(", ")));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn render_session(report: &SessionReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        out.push_str(&render_outcome(outcome));
    }

    out.push_str(&format!(
        "\n{} file(s): {} committed, {} no-op, {} skipped, {} rolled back, {} failed\n",
        report.files_analyzed,
        report.count(OutcomeStatus::Committed),
        report.count(OutcomeStatus::NoOp),
        report.count(OutcomeStatus::Skipped),
        report.count(OutcomeStatus::RolledBack),
        report.count(OutcomeStatus::Failed),
    ));
    out.push_str(&format!(
        "nodes: {} analyzed, {} selected, {} modified\n",
        report.nodes_analyzed, report.nodes_selected, report.nodes_modified
    ));
    out.push_str(&format!(
        "oracle: {} call(s), {} failure(s)",
        report.oracle_usage.calls, report.oracle_usage.failures
    ));
    out
}

fn render_outcome(outcome: &PatchOutcome) -> String {
    let mut out = format!(
        "[{}] {} (score {}, {}/{}/{} nodes)\n    {}\n",
        outcome.status.as_str(),
        outcome.file_path,
        outcome.score,
        outcome.nodes_modified,
        outcome.nodes_selected,
        outcome.nodes_analyzed,
        outcome.reasoning
    );
    if outcome.repaired {
        out.push_str("    repaired declarations after patch\n");
    }
    for violation in &outcome.violations {
        out.push_str(&format!("    violation: {violation}\n"));
    }
    for follow_up in &outcome.follow_ups {
        out.push_str(&format!("    follow-up: {follow_up}\n"));
    }
    out
}
