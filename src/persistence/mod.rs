//! Persistence contract for scraped events.
//!
//! The relational store lives outside this crate; it plugs in through
//! [`EventSink`]. [`MemoryEventStore`] is the in-process implementation used
//! by the CLI and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::{CandidateEvent, EventValidationError};

/// Result of inserting one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An event with the same `source_url` is already stored.
    Duplicate,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid event {url}: {source}")]
    Invalid {
        url: String,
        #[source]
        source: EventValidationError,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Destination for accepted events, keyed on `source_url`.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn insert(&self, event: &CandidateEvent) -> Result<InsertOutcome, PersistError>;
}

/// Counts from [`persist_events`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Insert a run's events, skipping those whose URL is already stored.
///
/// A failing insert is logged and counted; it does not stop the batch.
pub async fn persist_events<'a, I>(sink: &dyn EventSink, events: I) -> PersistSummary
where
    I: IntoIterator<Item = &'a CandidateEvent>,
{
    let mut summary = PersistSummary::default();
    for event in events {
        match sink.insert(event).await {
            Ok(InsertOutcome::Inserted) => summary.inserted += 1,
            Ok(InsertOutcome::Duplicate) => summary.duplicates += 1,
            Err(e) => {
                warn!("Failed to persist {}: {}", event.source_url, e);
                summary.failed += 1;
            }
        }
    }
    info!(
        "Persisted {} new events ({} already stored, {} failed)",
        summary.inserted, summary.duplicates, summary.failed
    );
    summary
}

/// In-memory event store. Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<CandidateEvent>>,
    by_url: RwLock<HashMap<String, usize>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    pub async fn get(&self, source_url: &str) -> Option<CandidateEvent> {
        let index = *self.by_url.read().await.get(source_url)?;
        self.events.read().await.get(index).cloned()
    }

    /// Stored events in insertion order.
    pub async fn all(&self) -> Vec<CandidateEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventSink for MemoryEventStore {
    async fn insert(&self, event: &CandidateEvent) -> Result<InsertOutcome, PersistError> {
        event.validate().map_err(|source| PersistError::Invalid {
            url: event.source_url.clone(),
            source,
        })?;

        let mut by_url = self.by_url.write().await;
        if by_url.contains_key(&event.source_url) {
            return Ok(InsertOutcome::Duplicate);
        }
        let mut events = self.events.write().await;
        by_url.insert(event.source_url.clone(), events.len());
        events.push(event.clone());
        Ok(InsertOutcome::Inserted)
    }
}
