//! Scoped page sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{BrowserTab, PageFactory};
use crate::scrapers::ScrapeError;

/// User agent sent with every navigation.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Timing and identity used by every [`PageSession`] of a run.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub user_agent: String,
    pub navigation_timeout: Duration,
    pub idle_timeout: Duration,
    /// Politeness delay after each page load.
    pub delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
            delay: Duration::from_secs(1),
        }
    }
}

impl SessionSettings {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One rendered page, owned by one scraper task for one fetch.
///
/// The tab is closed on every path: explicitly through [`close`], by `open`
/// itself when loading fails, and by `Drop` as a last resort.
///
/// [`close`]: PageSession::close
pub struct PageSession {
    factory: Arc<dyn PageFactory>,
    settings: SessionSettings,
    cancel: CancellationToken,
    tab: Option<Box<dyn BrowserTab>>,
    url: Option<String>,
}

impl PageSession {
    pub fn new(
        factory: Arc<dyn PageFactory>,
        settings: SessionSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            factory,
            settings,
            cancel,
            tab: None,
            url: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.tab.is_some()
    }

    /// URL this session was opened on.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Acquire a tab and load `url`, bounded by `timeout`.
    pub async fn open(&mut self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        if let Some(current) = &self.url {
            return Err(ScrapeError::SessionAlreadyOpen(current.clone()));
        }
        if self.cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled(url.to_string()));
        }

        let mut tab = self
            .factory
            .new_tab()
            .await
            .map_err(|e| ScrapeError::ResourceAcquisition(e.to_string()))?;

        if let Err(err) = load(tab.as_mut(), url, timeout, &self.settings, &self.cancel).await {
            if let Err(close_err) = tab.close().await {
                warn!("Failed to close tab after error on {}: {}", url, close_err);
            }
            return Err(err);
        }

        self.tab = Some(tab);
        self.url = Some(url.to_string());
        Ok(())
    }

    /// HTML of the loaded page.
    pub async fn html(&mut self) -> Result<String, ScrapeError> {
        let url = self.url.clone().unwrap_or_default();
        let tab = self.tab.as_mut().ok_or(ScrapeError::SessionNotOpen)?;
        tab.content()
            .await
            .map_err(|e| ScrapeError::extraction(url, e.to_string()))
    }

    /// Close the tab. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(mut tab) = self.tab.take() {
            if let Err(e) = tab.close().await {
                warn!("Failed to close tab: {}", e);
            }
        }
        self.url = None;
    }
}

async fn load(
    tab: &mut dyn BrowserTab,
    url: &str,
    timeout: Duration,
    settings: &SessionSettings,
    cancel: &CancellationToken,
) -> Result<(), ScrapeError> {
    tab.set_user_agent(&settings.user_agent)
        .await
        .map_err(|e| ScrapeError::Navigation {
            url: url.to_string(),
            reason: format!("failed to set user agent: {}", e),
        })?;

    debug!("Navigating to {}", url);
    tokio::select! {
        result = tokio::time::timeout(timeout, tab.navigate(url)) => match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(ScrapeError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ScrapeError::NavigationTimeout {
                    url: url.to_string(),
                    timeout,
                })
            }
        },
        _ = cancel.cancelled() => {
            return Err(ScrapeError::Cancelled(url.to_string()));
        }
    }

    tokio::select! {
        result = tokio::time::timeout(settings.idle_timeout, tab.wait_for_network_idle()) => match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Network idle check failed on {}: {}", url, e),
            Err(_) => warn!(
                "Timed out after {:?} waiting for network idle on {}",
                settings.idle_timeout, url
            ),
        },
        _ = cancel.cancelled() => {
            return Err(ScrapeError::Cancelled(url.to_string()));
        }
    }

    if !settings.delay.is_zero() {
        tokio::select! {
            _ = tokio::time::sleep(settings.delay) => {}
            _ = cancel.cancelled() => debug!("Delay cut short by cancellation"),
        }
    }

    Ok(())
}

impl Drop for PageSession {
    fn drop(&mut self) {
        let Some(mut tab) = self.tab.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = tab.close().await {
                        warn!("Failed to close dropped tab: {}", e);
                    }
                });
            }
            Err(_) => warn!("Page session dropped outside a runtime; tab left to the browser"),
        }
    }
}
