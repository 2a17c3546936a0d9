use crate::config::OracleSettings;
use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use nodepatch_engine::{ContentOracle, OracleError};
use nodepatch_protocol::{
    render_patch_prompt, render_relevance_prompt, PatchRequest, RelevanceRequest, PATCH_SYSTEM_PROMPT,
    RELEVANCE_SYSTEM_PROMPT,
};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Content Oracle backed by an OpenAI-compatible chat-completions endpoint
pub struct HttpOracle {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f32>,
}

impl HttpOracle {
    pub fn new(settings: &OracleSettings) -> Result<Self> {
        let url = settings
            .url
            .as_deref()
            .context("No oracle endpoint configured (set NODEPATCH_ORACLE_URL or [oracle].url)")?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: completions_endpoint(url),
            api_key: settings.api_key.clone(),
            model: settings.model().to_string(),
            temperature: settings.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn complete(&self, system: &str, user: String) -> Result<String, OracleError> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });
        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OracleError::transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(OracleError::api(format!("{status}: {text}")));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| OracleError::invalid_response(e.to_string()))?;
        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| OracleError::invalid_response("missing choices[0].message.content"))
    }
}

#[async_trait]
impl ContentOracle for HttpOracle {
    async fn assess_relevance(&self, request: &RelevanceRequest) -> Result<String, OracleError> {
        let prompt = render_relevance_prompt(request)
            .map_err(|e| OracleError::transport(format!("failed to render request: {e}")))?;
        self.complete(RELEVANCE_SYSTEM_PROMPT, prompt).await
    }

    async fn propose_edits(&self, request: &PatchRequest) -> Result<String, OracleError> {
        let prompt =
            render_patch_prompt(request).map_err(|e| OracleError::transport(format!("failed to render request: {e}")))?;
        self.complete(PATCH_SYSTEM_PROMPT, prompt).await
    }
}

fn completions_endpoint(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.ends_with("/chat/completions") {
        url.to_string()
    } else {
        format!("{url}/chat/completions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_accepts_base_or_full_url() {
        assert_eq!(
            completions_endpoint("http://localhost:8080/v1/"),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            completions_endpoint("https://api.example.com/v1/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn requires_an_endpoint() {
        assert!(HttpOracle::new(&OracleSettings::default()).is_err());
        let oracle = HttpOracle::new(&OracleSettings {
            url: Some("http://127.0.0.1:9/v1".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(oracle.endpoint(), "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(oracle.model, "gpt-4o-mini");
    }
}
