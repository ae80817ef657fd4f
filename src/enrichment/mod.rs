//! AI enrichment of candidate events with heuristic fallbacks.
//!
//! The service probes the backend before every operation. When the probe
//! fails, or the backend errors or answers with something unusable, the
//! matching rule from [`heuristics`] produces the result instead. Callers
//! never see backend errors.

pub mod heuristics;
mod parse;
mod prompts;

pub use parse::{parse_category, parse_keywords, parse_sentiment, Sentiment, SentimentAnalysis};

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::llm::TextGenerator;
use crate::models::{CandidateEvent, Category};

/// Backend availability snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub available: bool,
    pub model: String,
    pub endpoint: String,
}

/// Outcome of [`EnrichmentService::enrich_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Events that needed enrichment and were processed.
    pub processed: usize,
    /// Events that needed enrichment, before applying the limit.
    pub pending: usize,
    /// Events inspected.
    pub total: usize,
}

/// Classification, summary, keywords and sentiment for event listings.
pub struct EnrichmentService {
    backend: Arc<dyn TextGenerator>,
}

impl EnrichmentService {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self { backend }
    }

    /// Fill a prompt template with event content cut to the backend's limit.
    /// The template's instructions are never truncated.
    fn prompt(&self, template: &str, title: &str, description: &str) -> String {
        prompts::render(
            template,
            self.backend.truncate_content(title),
            self.backend.truncate_content(description),
        )
    }

    /// Run a prompt if the backend is up. `None` means use the fallback.
    async fn ask(&self, operation: &str, prompt: String) -> Option<String> {
        if !self.backend.is_available().await {
            warn!(
                "AI backend at {} unavailable, using basic {}",
                self.backend.endpoint(),
                operation
            );
            return None;
        }

        match self.backend.generate(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => Some(reply),
            Ok(_) => {
                warn!("AI backend returned an empty {} reply, using fallback", operation);
                None
            }
            Err(e) if e.is_malformed() => {
                warn!("Malformed AI {} reply, using fallback: {}", operation, e);
                None
            }
            Err(e) => {
                warn!("AI {} failed, using fallback: {}", operation, e);
                None
            }
        }
    }

    /// Category of an event.
    pub async fn classify_type(&self, title: &str, description: &str) -> Category {
        let prompt = self.prompt(prompts::CLASSIFY_PROMPT, title, description);
        if let Some(reply) = self.ask("classification", prompt).await {
            match parse_category(&reply) {
                Some(category) => return category,
                None => warn!("Unrecognized category label {:?}, using fallback", reply.trim()),
            }
        }
        heuristics::classify(title, description)
    }

    /// Short summary of an event, at most two sentences.
    pub async fn summarize(&self, title: &str, description: &str) -> String {
        let prompt = self.prompt(prompts::SUMMARY_PROMPT, title, description);
        match self.ask("summary", prompt).await {
            Some(reply) => reply.trim().to_string(),
            None => heuristics::summarize(description),
        }
    }

    /// Up to ten lowercase keywords.
    pub async fn extract_keywords(&self, title: &str, description: &str) -> Vec<String> {
        let prompt = self.prompt(prompts::KEYWORDS_PROMPT, title, description);
        if let Some(reply) = self.ask("keywords", prompt).await {
            let keywords = parse_keywords(&reply);
            if !keywords.is_empty() {
                return keywords;
            }
            warn!("No keywords parsed from AI reply, using fallback");
        }
        heuristics::keywords(title, description)
    }

    pub async fn analyze_sentiment(&self, title: &str, description: &str) -> SentimentAnalysis {
        let prompt = self.prompt(prompts::SENTIMENT_PROMPT, title, description);
        if let Some(reply) = self.ask("sentiment analysis", prompt).await {
            match parse_sentiment(&reply) {
                Some(analysis) => return analysis,
                None => warn!("Malformed sentiment JSON from AI backend, using neutral"),
            }
        }
        SentimentAnalysis::default()
    }

    /// Fill category, summary and tags of one event.
    ///
    /// A fixed category already set by the scraper is overwritten only when
    /// it is [`Category::Other`].
    pub async fn enrich_event(&self, event: &mut CandidateEvent) {
        let title = event.title.clone();
        let description = event.description_or_empty().to_string();

        if event.category == Category::Other {
            event.category = self.classify_type(&title, &description).await;
        }

        let summary = self.summarize(&title, &description).await;
        event.summary = (!summary.is_empty()).then_some(summary);

        let keywords = self.extract_keywords(&title, &description).await;
        for keyword in keywords {
            if !event.tags.contains(&keyword) {
                event.tags.push(keyword);
            }
        }
        debug!("Enriched {}", event.source_url);
    }

    /// Enrich events that still lack a summary or a category, up to `limit`.
    pub async fn enrich_batch(&self, events: &mut [CandidateEvent], limit: usize) -> BatchSummary {
        let total = events.len();
        let pending: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.summary.is_none() || e.category == Category::Other)
            .map(|(i, _)| i)
            .collect();

        let mut processed = 0;
        for &index in pending.iter().take(limit) {
            self.enrich_event(&mut events[index]).await;
            processed += 1;
        }

        info!(
            "Enriched {} of {} pending events ({} total)",
            processed,
            pending.len(),
            total
        );
        BatchSummary {
            processed,
            pending: pending.len(),
            total,
        }
    }

    pub async fn status(&self) -> BackendStatus {
        BackendStatus {
            available: self.backend.is_available().await,
            model: self.backend.model().to_string(),
            endpoint: self.backend.endpoint().to_string(),
        }
    }
}
