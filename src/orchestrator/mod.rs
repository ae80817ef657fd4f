//! Concurrent execution of every registered source.
//!
//! A run spawns one task per scraper over a snapshot of the registry, waits
//! for all of them, and only then publishes results and statistics. A
//! failing or panicking source contributes an empty result and a recorded
//! failure; it never affects the other sources.

mod stats;

pub use stats::{OrchestrationStats, RunReport, RunResult, SourceFailure};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::CandidateEvent;
use crate::scrapers::{PageFactory, ScrapeContext, SessionSettings, SourceScraper};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a scraper named {0:?} is already registered")]
    DuplicateName(String),
}

/// Lifecycle of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Completed,
}

struct LastRun {
    report: Arc<RunReport>,
    stats: OrchestrationStats,
}

/// Marks a run in flight until dropped.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the registered scrapers and runs them in parallel.
pub struct Orchestrator {
    scrapers: RwLock<Vec<Arc<dyn SourceScraper>>>,
    pages: Arc<dyn PageFactory>,
    settings: SessionSettings,
    last_run: RwLock<Option<LastRun>>,
    in_flight: Arc<AtomicUsize>,
}

impl Orchestrator {
    pub fn new(pages: Arc<dyn PageFactory>, settings: SessionSettings) -> Self {
        Self {
            scrapers: RwLock::new(Vec::new()),
            pages,
            settings,
            last_run: RwLock::new(None),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a scraper. Names must be unique.
    ///
    /// Runs already in flight keep their own snapshot of the registry.
    pub async fn add_scraper(&self, scraper: Arc<dyn SourceScraper>) -> Result<(), RegistryError> {
        let mut scrapers = self.scrapers.write().await;
        if scrapers.iter().any(|s| s.name() == scraper.name()) {
            return Err(RegistryError::DuplicateName(scraper.name().to_string()));
        }
        info!("Scraper {} added", scraper.name());
        scrapers.push(scraper);
        Ok(())
    }

    /// Registered source names, in registration order.
    pub async fn source_names(&self) -> Vec<String> {
        self.scrapers
            .read()
            .await
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    fn state_now(&self, has_run: bool) -> RunState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            RunState::Running
        } else if has_run {
            RunState::Completed
        } else {
            RunState::Idle
        }
    }

    pub async fn state(&self) -> RunState {
        let has_run = self.last_run.read().await.is_some();
        self.state_now(has_run)
    }

    /// Run every registered source concurrently and wait for all of them.
    pub async fn run_all(&self, cancel: CancellationToken) -> Arc<RunReport> {
        let guard = InFlight::enter(&self.in_flight);
        self.run_guarded(guard, cancel).await
    }

    /// Start a run in the background and return the names of the sources
    /// it will execute.
    pub async fn trigger_run(self: &Arc<Self>, cancel: CancellationToken) -> Vec<String> {
        let names = self.source_names().await;
        let guard = InFlight::enter(&self.in_flight);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_guarded(guard, cancel).await;
        });
        names
    }

    async fn run_guarded(&self, _guard: InFlight, cancel: CancellationToken) -> Arc<RunReport> {
        let scrapers: Vec<Arc<dyn SourceScraper>> = self.scrapers.read().await.clone();

        if scrapers.is_empty() {
            warn!("No scrapers configured");
            let report = Arc::new(RunReport::empty());
            self.publish(Arc::clone(&report), 0).await;
            return report;
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("Starting run {} with {} scrapers", run_id, scrapers.len());

        let handles: Vec<_> = scrapers
            .iter()
            .map(|scraper| {
                let scraper = Arc::clone(scraper);
                let mut ctx =
                    ScrapeContext::new(Arc::clone(&self.pages), self.settings.clone(), cancel.clone());
                if let Some(delay) = scraper.request_delay() {
                    ctx = ctx.with_delay(delay);
                }
                tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = scraper.scrape_events(&ctx).await;
                    (outcome, started.elapsed())
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (scraper, handle) in scrapers.iter().zip(handles) {
            let source = scraper.name().to_string();
            let result = match handle.await {
                Ok((Ok(events), elapsed)) => {
                    info!("Scraper {} found {} events", source, events.len());
                    RunResult {
                        source,
                        outcome: Ok(events),
                        elapsed,
                    }
                }
                Ok((Err(e), elapsed)) => {
                    error!("Scraper {} failed: {}", source, e);
                    RunResult {
                        source,
                        outcome: Err((&e).into()),
                        elapsed,
                    }
                }
                Err(join_err) => {
                    error!("Scraper {} task aborted: {}", source, join_err);
                    RunResult {
                        source,
                        outcome: Err(SourceFailure::panicked(join_err.to_string())),
                        elapsed: std::time::Duration::ZERO,
                    }
                }
            };
            results.push(result);
        }

        let report = Arc::new(RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            results,
        });
        self.publish(Arc::clone(&report), scrapers.len()).await;
        report
    }

    async fn publish(&self, report: Arc<RunReport>, sources_registered: usize) {
        let stats = report.stats(sources_registered);
        info!(
            "Run {} finished: {} events from {} sources ({} failed)",
            report.run_id,
            stats.total_events,
            stats.sources_executed,
            stats.failures.len()
        );
        *self.last_run.write().await = Some(LastRun { report, stats });
    }

    /// Report of the most recently finished run.
    pub async fn last_report(&self) -> Option<Arc<RunReport>> {
        self.last_run
            .read()
            .await
            .as_ref()
            .map(|r| Arc::clone(&r.report))
    }

    /// Statistics of the last run; zeroed with the current registry size
    /// before the first run.
    pub async fn stats(&self) -> OrchestrationStats {
        if let Some(last) = self.last_run.read().await.as_ref() {
            return last.stats.clone();
        }
        OrchestrationStats {
            sources_registered: self.scrapers.read().await.len(),
            ..OrchestrationStats::default()
        }
    }

    /// Every record of the last run. Duplicates are kept.
    pub async fn get_all_events(&self) -> Vec<CandidateEvent> {
        self.last_report()
            .await
            .map(|r| r.events())
            .unwrap_or_default()
    }

    /// Records of the last run, first occurrence per `source_url` only.
    pub async fn unique_events(&self) -> Vec<CandidateEvent> {
        self.last_report()
            .await
            .map(|r| r.unique_events())
            .unwrap_or_default()
    }

    /// Records of one source from the last run.
    pub async fn get_events_by_source(&self, name: &str) -> Vec<CandidateEvent> {
        self.last_report()
            .await
            .map(|r| r.events_for(name))
            .unwrap_or_default()
    }
}
