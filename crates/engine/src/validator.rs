//! Structure validation and bounded repair
//!
//! Four file-level invariants are checked against the pre-patch fingerprint:
//! every import line, every export line, the primary identifier, and the
//! default export marker. Repair is a single pass that only re-inserts
//! declaration lines lost by the patch; it never calls the oracle. A
//! declaration that sat on a line an edit replaced is never re-inserted,
//! since the replacement already stands in for that line.

use crate::error::{EngineError, Result, Violation};
use nodepatch_markup_index::{has_default_export, StructuralFingerprint};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check a patched buffer against the pre-patch fingerprint
pub fn validate(content: &str, fingerprint: &StructuralFingerprint) -> ValidationReport {
    let mut violations = Vec::new();

    for import in &fingerprint.imports {
        if !content.contains(import.as_str()) {
            violations.push(Violation::MissingImport(import.clone()));
        }
    }
    for export in &fingerprint.exports {
        if !content.contains(export.as_str()) {
            violations.push(Violation::MissingExport(export.clone()));
        }
    }
    if let Some(name) = &fingerprint.primary_identifier {
        if !contains_identifier(content, name) {
            violations.push(Violation::MissingPrimaryIdentifier(name.clone()));
        }
    }
    if fingerprint.has_default_export && !has_default_export(content) {
        violations.push(Violation::MissingDefaultExport);
    }

    ValidationReport { violations }
}

/// Validate a patched buffer, repairing it when needed
///
/// Returns the buffer to commit and whether repair was applied, or
/// `StructuralViolation` listing what the patch broke.
pub fn validate_or_repair(
    content: String,
    fingerprint: &StructuralFingerprint,
    original: &str,
    edited_lines: &[RangeInclusive<usize>],
) -> Result<(String, bool)> {
    let report = validate(&content, fingerprint);
    if report.is_valid() {
        return Ok((content, false));
    }
    log::debug!("{} structural violation(s), attempting repair", report.violations.len());
    repair(&content, fingerprint, original, edited_lines)
        .map(|fixed| (fixed, true))
        .ok_or(EngineError::StructuralViolation(report.violations))
}

/// Re-insert lost import/export lines at their original relative positions
///
/// `edited_lines` are the original 1-indexed ranges replaced by edits.
/// Returns `None` when a lost declaration lived inside one of them or when
/// the repaired buffer still fails validation.
pub fn repair(
    content: &str,
    fingerprint: &StructuralFingerprint,
    original: &str,
    edited_lines: &[RangeInclusive<usize>],
) -> Option<String> {
    let original_lines: Vec<&str> = original.split('\n').collect();
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    let shift = lines.len() as isize - original_lines.len() as isize;

    let missing = fingerprint
        .imports
        .iter()
        .map(|line| (line, true))
        .chain(fingerprint.exports.iter().map(|line| (line, false)))
        .filter(|(line, _)| !content.contains(line.as_str()));

    let mut used_origins: Vec<usize> = Vec::new();
    for (declaration, is_import) in missing {
        if lines.iter().any(|l| l.contains(declaration.as_str())) {
            continue;
        }
        let Some(origin) = original_lines
            .iter()
            .enumerate()
            .position(|(i, l)| l.trim() == declaration && !used_origins.contains(&i))
        else {
            continue;
        };
        if edited_lines.iter().any(|range| range.contains(&(origin + 1))) {
            log::debug!("`{declaration}` was replaced by an edit on line {}; not repairable", origin + 1);
            return None;
        }
        used_origins.push(origin);

        let at = anchor_position(&original_lines, origin, &lines, shift).unwrap_or(if is_import {
            0
        } else {
            end_position(&lines)
        });
        log::debug!("Re-inserting `{declaration}` at line {}", at + 1);
        lines.insert(at, original_lines[origin].to_string());
    }

    let repaired = lines.join("\n");
    if validate(&repaired, fingerprint).is_valid() {
        Some(repaired)
    } else {
        None
    }
}

/// Insertion index after the nearest surviving preceding line, else before the nearest following one
fn anchor_position(original: &[&str], origin: usize, lines: &[String], shift: isize) -> Option<usize> {
    for j in (0..origin).rev() {
        if let Some(p) = locate(original, j, lines, shift, true) {
            return Some(p + 1);
        }
    }
    for j in origin + 1..original.len() {
        if let Some(p) = locate(original, j, lines, shift, false) {
            return Some(p);
        }
    }
    None
}

/// Where original line `j` lives in the current buffer, if it survived
///
/// Among repeated lines the occurrence closest to `j` (unshifted or shifted by
/// the net growth of the buffer) is chosen. The empty piece after a final
/// newline never anchors.
fn locate(original: &[&str], j: usize, lines: &[String], shift: isize, allow_blank: bool) -> Option<usize> {
    let wanted = original[j].trim();
    let terminator = j + 1 == original.len() && original[j].is_empty();
    if terminator || (wanted.is_empty() && !allow_blank) {
        return None;
    }
    let last = lines.len().saturating_sub(1);
    let j = j as isize;
    lines
        .iter()
        .enumerate()
        .filter(|(p, l)| l.trim() == wanted && !(*p == last && l.is_empty()))
        .map(|(p, _)| p)
        .min_by_key(|&p| {
            let p = p as isize;
            (p - j).abs().min((p - (j + shift)).abs())
        })
}

/// End of file, keeping a trailing newline last
fn end_position(lines: &[String]) -> usize {
    match lines.last() {
        Some(last) if last.is_empty() => lines.len() - 1,
        _ => lines.len(),
    }
}

fn contains_identifier(content: &str, name: &str) -> bool {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    content.match_indices(name).any(|(at, _)| {
        let before = content[..at].chars().next_back();
        let after = content[at + name.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}
