//! Text-generation backend.
//!
//! [`TextGenerator`] is the seam the enrichment service talks to;
//! [`LlmClient`] implements it over the Ollama HTTP API.

mod client;

pub use client::{LlmClient, LlmConfig};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// A backend that turns prompts into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Fast liveness probe. Never errors; unreachable means `false`.
    async fn is_available(&self) -> bool;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    fn model(&self) -> &str;

    fn endpoint(&self) -> &str;

    /// Cut event content to what the backend accepts in one prompt.
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        text
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM is disabled")]
    Disabled,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// The backend could not be reached or refused the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LlmError::Disabled
                | LlmError::Connection(_)
                | LlmError::Timeout(_)
                | LlmError::Api { .. }
        )
    }

    /// The backend answered with something unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, LlmError::Parse(_))
    }
}
