//! Candidate event model.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Category;

/// An extracted event that has not been persisted yet.
///
/// `source_url` is the natural key: two candidates with the same URL are
/// the same event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Short summary, filled in by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub start_time: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    pub venue_name: String,
    pub city: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub is_free: bool,
    #[serde(default)]
    pub category: Category,
    pub source_url: String,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Invariant violations reported by [`CandidateEvent::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventValidationError {
    #[error("event has an empty title")]
    EmptyTitle,
    #[error("event has an empty source URL")]
    EmptySourceUrl,
    #[error("free event carries a non-zero price ({0})")]
    FreeWithPrice(Decimal),
    #[error("event ends before it starts")]
    EndsBeforeStart,
}

impl CandidateEvent {
    /// Create a new candidate with the required fields.
    ///
    /// The event starts out free with no price, no tags, and category
    /// [`Category::Other`].
    pub fn new(
        title: impl Into<String>,
        start_time: NaiveDateTime,
        venue_name: impl Into<String>,
        city: impl Into<String>,
        region: impl Into<String>,
        source_url: impl Into<String>,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            summary: None,
            start_time,
            end_time: None,
            venue_name: venue_name.into(),
            city: city.into(),
            region: region.into(),
            address: None,
            price: None,
            is_free: true,
            category: Category::Other,
            source_url: source_url.into(),
            source_name: source_name.into(),
            tags: Vec::new(),
            image_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    pub fn with_end_time(mut self, end_time: NaiveDateTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the ticket price. A zero price marks the event free.
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.is_free = price.is_zero();
        self.price = Some(price);
        self
    }

    /// Mark the event free, clearing any non-zero price.
    pub fn mark_free(mut self) -> Self {
        self.is_free = true;
        if self.price.is_some_and(|p| !p.is_zero()) {
            self.price = None;
        }
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Description text, or an empty string.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Check the record's invariants.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.title.trim().is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }
        if self.source_url.trim().is_empty() {
            return Err(EventValidationError::EmptySourceUrl);
        }
        if self.is_free {
            if let Some(price) = self.price.filter(|p| !p.is_zero()) {
                return Err(EventValidationError::FreeWithPrice(price));
            }
        }
        if self.end_time.is_some_and(|end| end < self.start_time) {
            return Err(EventValidationError::EndsBeforeStart);
        }
        Ok(())
    }
}

/// Drop events whose `source_url` was already seen, keeping the first.
pub fn dedupe_by_source_url<I>(events: I) -> Vec<CandidateEvent>
where
    I: IntoIterator<Item = CandidateEvent>,
{
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|e| seen.insert(e.source_url.clone()))
        .collect()
}
