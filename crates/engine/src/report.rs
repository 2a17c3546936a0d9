use crate::error::Violation;
use crate::oracle::OracleUsageSnapshot;
use crate::paths::ProjectPath;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Committed,
    NoOp,
    Skipped,
    RolledBack,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::NoOp => "no_op",
            Self::Skipped => "skipped",
            Self::RolledBack => "rolled_back",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOutcome {
    pub file_path: ProjectPath,
    pub status: OutcomeStatus,
    pub success: bool,
    pub nodes_analyzed: usize,
    pub nodes_selected: usize,
    pub nodes_modified: usize,
    pub score: u8,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_ups: Vec<String>,
    #[serde(default)]
    pub repaired: bool,
}

impl PatchOutcome {
    fn new(file_path: ProjectPath, status: OutcomeStatus, success: bool, reasoning: impl Into<String>) -> Self {
        Self {
            file_path,
            status,
            success,
            nodes_analyzed: 0,
            nodes_selected: 0,
            nodes_modified: 0,
            score: 0,
            reasoning: reasoning.into(),
            violations: Vec::new(),
            follow_ups: Vec::new(),
            repaired: false,
        }
    }

    pub fn committed(file_path: ProjectPath, reasoning: impl Into<String>) -> Self {
        Self::new(file_path, OutcomeStatus::Committed, true, reasoning)
    }

    /// Content left unchanged on purpose; counts as success
    pub fn no_op(file_path: ProjectPath, reasoning: impl Into<String>) -> Self {
        Self::new(file_path, OutcomeStatus::NoOp, true, reasoning)
    }

    pub fn skipped(file_path: ProjectPath, reasoning: impl Into<String>) -> Self {
        Self::new(file_path, OutcomeStatus::Skipped, false, reasoning)
    }

    pub fn rolled_back(file_path: ProjectPath, violations: Vec<Violation>) -> Self {
        let reasoning = format!(
            "structural validation failed: {}",
            violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
        );
        Self {
            violations,
            ..Self::new(file_path, OutcomeStatus::RolledBack, false, reasoning)
        }
    }

    pub fn failed(file_path: ProjectPath, reasoning: impl Into<String>) -> Self {
        Self::new(file_path, OutcomeStatus::Failed, false, reasoning)
    }

    #[must_use]
    pub fn with_counts(mut self, analyzed: usize, selected: usize, modified: usize) -> Self {
        self.nodes_analyzed = analyzed;
        self.nodes_selected = selected;
        self.nodes_modified = modified;
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: u8) -> Self {
        self.score = score;
        self
    }

    #[must_use]
    pub fn with_follow_ups(mut self, follow_ups: Vec<String>) -> Self {
        self.follow_ups = follow_ups;
        self
    }

    #[must_use]
    pub fn with_repaired(mut self, repaired: bool) -> Self {
        self.repaired = repaired;
        self
    }

    pub fn is_committed(&self) -> bool {
        self.status == OutcomeStatus::Committed
    }
}

/// Session summary exported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub success: bool,
    pub files_analyzed: usize,
    pub files_modified: usize,
    pub nodes_analyzed: usize,
    pub nodes_selected: usize,
    pub nodes_modified: usize,
    pub oracle_usage: OracleUsageSnapshot,
    /// Ordered as the files were given
    pub outcomes: Vec<PatchOutcome>,
}

impl SessionReport {
    pub fn from_outcomes(outcomes: Vec<PatchOutcome>, oracle_usage: OracleUsageSnapshot) -> Self {
        let files_modified = outcomes.iter().filter(|o| o.is_committed()).count();
        Self {
            success: files_modified > 0,
            files_analyzed: outcomes.len(),
            files_modified,
            nodes_analyzed: outcomes.iter().map(|o| o.nodes_analyzed).sum(),
            nodes_selected: outcomes.iter().map(|o| o.nodes_selected).sum(),
            nodes_modified: outcomes
                .iter()
                .filter(|o| o.is_committed())
                .map(|o| o.nodes_modified)
                .sum(),
            oracle_usage,
            outcomes,
        }
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn outcome(&self, path: &str) -> Option<&PatchOutcome> {
        self.outcomes.iter().find(|o| o.file_path.as_str() == path)
    }
}
