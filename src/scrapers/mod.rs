//! Event source scrapers.
//!
//! Every source implements [`SourceScraper`]. The orchestrator hands each
//! scraper a [`ScrapeContext`] for the run, through which it opens
//! [`PageSession`]s; scrapers never hold browser state of their own.

pub mod browser;
pub mod config;
mod error;
mod example;
pub mod extract;
mod selector;

pub use browser::{
    BrowserEngineConfig, BrowserTab, ChromiumBrowser, PageFactory, PageSession, SessionSettings,
};
pub use config::{SelectorConfig, SourceConfig, SourceConfigError};
pub use error::ScrapeError;
pub use example::ExampleScraper;
pub use selector::SelectorScraper;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::models::CandidateEvent;

/// Contract every event source fulfils.
///
/// Implementations must not share mutable state between runs and must
/// report failures as [`ScrapeError`] values.
#[async_trait]
pub trait SourceScraper: Send + Sync {
    /// Unique source name.
    fn name(&self) -> &str;

    fn base_url(&self) -> &str;

    /// Politeness delay override; `None` uses the run default.
    fn request_delay(&self) -> Option<Duration> {
        None
    }

    async fn scrape_events(&self, ctx: &ScrapeContext) -> Result<Vec<CandidateEvent>, ScrapeError>;
}

/// Per-task handle to the run's browser, timing and cancellation.
#[derive(Clone)]
pub struct ScrapeContext {
    pages: Arc<dyn PageFactory>,
    settings: SessionSettings,
    cancel: CancellationToken,
}

impl ScrapeContext {
    pub fn new(
        pages: Arc<dyn PageFactory>,
        settings: SessionSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pages,
            settings,
            cancel,
        }
    }

    /// Same context with a different politeness delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.settings.delay = delay;
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Open a fresh page session on `url`. The caller owns closing it.
    pub async fn open_page(&self, url: &str) -> Result<PageSession, ScrapeError> {
        let mut session = PageSession::new(
            Arc::clone(&self.pages),
            self.settings.clone(),
            self.cancel.clone(),
        );
        session.open(url, self.settings.navigation_timeout).await?;
        Ok(session)
    }

    /// Load `url`, return its HTML and close the page.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let mut page = self.open_page(url).await?;
        let html = page.html().await;
        page.close().await;
        html
    }
}
