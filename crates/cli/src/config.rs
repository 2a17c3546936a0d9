use anyhow::{Context as AnyhowContext, Result};
use nodepatch_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_ORACLE_URL: &str = "NODEPATCH_ORACLE_URL";
pub const ENV_ORACLE_API_KEY: &str = "NODEPATCH_ORACLE_API_KEY";
pub const ENV_ORACLE_MODEL: &str = "NODEPATCH_ORACLE_MODEL";

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleSettings {
    /// Base URL (`.../v1`) or the full `/chat/completions` URL
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

impl OracleSettings {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Environment variables override file values
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(url) = non_empty(ENV_ORACLE_URL) {
            self.url = Some(url);
        }
        if let Some(key) = non_empty(ENV_ORACLE_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty(ENV_ORACLE_MODEL) {
            self.model = Some(model);
        }
    }
}

/// Contents of a `nodepatch.toml` file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub engine: EngineConfig,
    pub oracle: OracleSettings,
}

impl FileConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Invalid config file")?;
        config
            .engine
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [engine] settings: {e}"))?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("In {}", path.display()))
    }

    /// Load `path` if given, otherwise defaults; then apply process environment
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.oracle.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn empty_file_means_defaults() {
        assert_eq!(FileConfig::parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn parses_partial_tables() {
        let config = FileConfig::parse(
            r#"
[engine]
relevance_threshold = 80
file_concurrency = 2

[oracle]
url = "http://localhost:8080/v1"
"#,
        )
        .unwrap();
        assert_eq!(config.engine.relevance_threshold, 80);
        assert_eq!(config.engine.file_concurrency, 2);
        assert_eq!(config.engine.max_candidate_nodes, 20);
        assert_eq!(config.oracle.url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(config.oracle.model(), "gpt-4o-mini");
    }

    #[test]
    fn rejects_invalid_engine_values() {
        let err = FileConfig::parse("[engine]\nfile_concurrency = 0\n").unwrap_err();
        assert!(err.to_string().contains("file_concurrency"));
        assert!(FileConfig::parse("[engine]\nrelevance_threshold = \"high\"\n").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_ORACLE_URL, "http://oracle.internal/v1"),
            (ENV_ORACLE_MODEL, "  "),
        ]);
        let mut settings = OracleSettings {
            url: Some("http://file/v1".into()),
            model: Some("from-file".into()),
            ..Default::default()
        };
        settings.apply_env(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(settings.url.as_deref(), Some("http://oracle.internal/v1"));
        assert_eq!(settings.model(), "from-file");
        assert_eq!(settings.api_key, None);
    }
}
