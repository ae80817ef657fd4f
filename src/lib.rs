//! EventRadar - concurrent event-listing acquisition.
//!
//! Scrapes event listings from independent sources in parallel, isolates
//! per-source failures, and enriches the resulting records through an
//! Ollama-compatible text-generation backend with local heuristic
//! fallbacks when the backend is unreachable.

pub mod config;
pub mod enrichment;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod persistence;
pub mod scrapers;

pub use enrichment::EnrichmentService;
pub use models::{CandidateEvent, Category};
pub use orchestrator::{
    OrchestrationStats, Orchestrator, RegistryError, RunReport, RunResult, RunState, SourceFailure,
};
pub use persistence::{persist_events, EventSink, MemoryEventStore};
pub use scrapers::{ScrapeContext, ScrapeError, SourceScraper};
