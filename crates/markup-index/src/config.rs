use serde::{Deserialize, Serialize};

/// Configuration for markup indexing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Lines of surrounding source captured on each side of a node
    pub context_lines: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self { context_lines: 3 }
    }
}

impl IndexerConfig {
    /// Builder: set context window
    #[must_use]
    pub const fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }
}
