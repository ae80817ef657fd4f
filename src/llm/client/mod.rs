//! Ollama client.

mod config;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use config::LlmConfig;

use super::{LlmError, TextGenerator};

/// HTTP client for an Ollama-compatible `/api/generate` endpoint.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn map_send_error(&self, err: reqwest::Error, timeout: Duration) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(timeout)
        } else {
            LlmError::Connection(err.to_string())
        }
    }

    /// List models the backend has pulled.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let timeout = Duration::from_secs(self.config.probe_timeout_secs);
        let resp = self
            .client
            .get(self.url("/api/tags"))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, timeout))?;

        if !resp.status().is_success() {
            return Err(LlmError::Api {
                status: resp.status().as_u16(),
                body: String::new(),
            });
        }

        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn is_available(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        match self
            .client
            .get(self.url("/api/tags"))
            .timeout(Duration::from_secs(self.config.probe_timeout_secs))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Liveness probe to {} failed: {}", self.config.endpoint, e);
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }

        let request = OllamaRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let resp = self
            .client
            .post(self.url("/api/generate"))
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, timeout))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let ollama_resp: OllamaResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(timeout)
            } else {
                LlmError::Parse(e.to_string())
            }
        })?;

        Ok(ollama_resp.response.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Char-safe cut at `max_content_chars`.
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.config.max_content_chars) {
            Some((end, _)) => &text[..end],
            None => text,
        }
    }
}
