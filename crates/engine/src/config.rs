use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a patch session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum oracle score (0-100) for a file to be patched
    pub relevance_threshold: u8,

    /// Maximum number of nodes described to the oracle per file
    pub max_candidate_nodes: usize,

    /// Characters of node text shown in each candidate preview
    pub preview_chars: usize,

    /// Lines of surrounding source captured on each side of a node
    pub context_lines: usize,

    /// Files processed in parallel (1 = sequential)
    pub file_concurrency: usize,

    /// Oracle exchanges in flight across the whole session
    pub oracle_concurrency: usize,

    /// Upper bound for a single oracle exchange
    pub oracle_timeout_secs: u64,

    /// Drop selected nodes that contain another selected node
    pub prune_nested_targets: bool,

    /// Validate but never write to disk
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 70,
            max_candidate_nodes: 20,
            preview_chars: 50,
            context_lines: 3,
            file_concurrency: 1,
            oracle_concurrency: 2,
            oracle_timeout_secs: 120,
            prune_nested_targets: true,
            dry_run: false,
        }
    }
}

impl EngineConfig {
    /// Preset for previewing a change set without touching disk
    pub fn preview() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }

    /// Preset for larger batches: several files and oracle calls in flight
    pub fn parallel(file_concurrency: usize) -> Self {
        let file_concurrency = file_concurrency.max(1);
        Self {
            file_concurrency,
            oracle_concurrency: file_concurrency.max(2),
            ..Default::default()
        }
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.relevance_threshold > 100 {
            return Err(format!(
                "relevance_threshold ({}) must be within 0..=100",
                self.relevance_threshold
            ));
        }

        if self.max_candidate_nodes == 0 {
            return Err("max_candidate_nodes must be > 0".to_string());
        }

        if self.file_concurrency == 0 {
            return Err("file_concurrency must be > 0".to_string());
        }

        if self.oracle_concurrency == 0 {
            return Err("oracle_concurrency must be > 0".to_string());
        }

        if self.oracle_timeout_secs == 0 {
            return Err("oracle_timeout_secs must be > 0".to_string());
        }

        Ok(())
    }
}
