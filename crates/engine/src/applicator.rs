use crate::planner::NodeEdit;
use nodepatch_markup_index::MarkupNode;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Result of splicing edits into a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub content: String,
    /// Edits whose replacement survives in `content`
    pub applied_count: usize,
    /// Node ids whose edits were absorbed by an overlapping lower edit
    pub superseded: Vec<String>,
    /// Original 1-indexed line ranges replaced by surviving edits, ascending
    pub edited_lines: Vec<RangeInclusive<usize>>,
}

struct AppliedRegion {
    node_id: String,
    start_line: usize,
    end_line: usize,
    /// Current line count minus original line count
    delta: isize,
}

/// Splice node replacements into `content`, highest start line first
///
/// Lines outside the replaced spans are preserved byte-for-byte. Replacement
/// lines take the line ending of the lines they replace, and one trailing
/// newline on a replacement is dropped. No validation happens here.
pub fn apply_edits(content: &str, nodes: &[MarkupNode], edits: &[NodeEdit]) -> ApplyResult {
    let by_id: HashMap<&str, &MarkupNode> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut work: Vec<(&MarkupNode, &NodeEdit)> = Vec::with_capacity(edits.len());
    for edit in edits {
        match by_id.get(edit.node_id.as_str()) {
            Some(node) if work.iter().all(|(n, _)| n.id != node.id) => work.push((node, edit)),
            Some(_) => log::debug!("Duplicate edit for {} ignored", edit.node_id),
            None => log::debug!("Edit for unknown node {} ignored", edit.node_id),
        }
    }
    // Same start line: the inner node goes first so the enclosing one absorbs it.
    work.sort_by(|(a, _), (b, _)| {
        b.span
            .start_line
            .cmp(&a.span.start_line)
            .then(a.span.end_line.cmp(&b.span.end_line))
    });

    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    let mut regions: Vec<AppliedRegion> = Vec::new();
    let mut superseded: Vec<String> = Vec::new();

    for (node, edit) in work {
        let start = node.span.start_line;
        let mut end = node.span.end_line;
        if start == 0 || start > lines.len() {
            log::warn!("Edit for {} starts outside the buffer (line {start})", node.id);
            continue;
        }

        let (overlapped, kept): (Vec<AppliedRegion>, Vec<AppliedRegion>) =
            regions.into_iter().partition(|r| r.start_line <= end && r.end_line >= start);
        regions = kept;

        let mut absorbed_delta = 0isize;
        for region in &overlapped {
            log::warn!(
                "Edit for {} (lines {start}-{end}) overlaps applied edit for {} (lines {}-{}); lower edit wins",
                node.id,
                region.node_id,
                region.start_line,
                region.end_line
            );
            end = end.max(region.end_line);
            absorbed_delta += region.delta;
            superseded.push(region.node_id.clone());
        }

        let original_len = end - start + 1;
        let current_len = (original_len as isize + absorbed_delta).max(0) as usize;
        let from = start - 1;
        let to = (from + current_len).min(lines.len());

        let replacement = replacement_lines(&edit.replacement_text, &lines[from..to]);
        let new_len = replacement.len();
        lines.splice(from..to, replacement);

        regions.push(AppliedRegion {
            node_id: node.id.clone(),
            start_line: start,
            end_line: end,
            delta: new_len as isize - original_len as isize,
        });
    }

    regions.sort_by_key(|r| r.start_line);
    ApplyResult {
        content: lines.join("\n"),
        applied_count: regions.len(),
        superseded,
        edited_lines: regions.iter().map(|r| r.start_line..=r.end_line).collect(),
    }
}

/// Split a replacement into buffer lines matching the replaced lines' endings
fn replacement_lines(text: &str, replaced: &[String]) -> Vec<String> {
    let text = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text);
    let crlf = replaced.iter().any(|l| l.ends_with('\r'));
    // The last replaced line may be the final line of a file without a newline
    let last_crlf = replaced.last().is_some_and(|l| l.ends_with('\r'));

    let pieces: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
    let last = pieces.len() - 1;
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            if (i < last && crlf) || (i == last && last_crlf) {
                format!("{piece}\r")
            } else {
                piece.to_string()
            }
        })
        .collect()
}
