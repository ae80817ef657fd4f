//! Parsing of backend replies.
//!
//! Each parser returns `None` for a reply it cannot use, which sends the
//! caller down the heuristic path.

use serde::{Deserialize, Serialize};

use crate::models::Category;

use super::heuristics::MAX_KEYWORDS;

/// Overall tone of an event listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" | "positivo" => Some(Self::Positive),
            "neutral" | "neutro" => Some(Self::Neutral),
            "negative" | "negativo" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Result of sentiment analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    /// In `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub main_topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
}

impl Default for SentimentAnalysis {
    fn default() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            confidence: 0.5,
            main_topics: Vec::new(),
            target_audience: None,
        }
    }
}

/// Map a classification reply to a category.
///
/// Only the first non-empty line counts, and a `Label:` style prefix is
/// dropped. Unknown labels yield `None`.
pub fn parse_category(reply: &str) -> Option<Category> {
    let line = reply.lines().map(str::trim).find(|l| !l.is_empty())?;
    let label = line.rsplit(':').next().unwrap_or(line);
    Category::from_label(label)
}

/// Split a comma-separated keyword reply.
pub fn parse_keywords(reply: &str) -> Vec<String> {
    let cleaned = reply
        .trim()
        .trim_start_matches("Keywords:")
        .trim_start_matches("Palavras-chave:")
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();

    let mut keywords: Vec<String> = Vec::new();
    for raw in cleaned.split([',', '\n']) {
        let keyword = raw
            .trim()
            .to_lowercase()
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '-')
            .to_string();
        if keyword.is_empty() || keyword.chars().count() > 50 || keywords.contains(&keyword) {
            continue;
        }
        keywords.push(keyword);
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }
    keywords
}

#[derive(Deserialize)]
struct RawSentiment {
    sentiment: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    main_topics: Vec<String>,
    #[serde(default)]
    target_audience: Option<String>,
}

/// Parse the first JSON object in a sentiment reply.
///
/// Tolerates code fences and prose around the object. Confidence is
/// clamped to `[0, 1]`.
pub fn parse_sentiment(reply: &str) -> Option<SentimentAnalysis> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    let raw: RawSentiment = serde_json::from_str(&reply[start..=end]).ok()?;
    let sentiment = Sentiment::from_label(&raw.sentiment)?;
    let confidence = raw
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.5);

    Some(SentimentAnalysis {
        sentiment,
        confidence,
        main_topics: raw
            .main_topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        target_audience: raw
            .target_audience
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()),
    })
}
