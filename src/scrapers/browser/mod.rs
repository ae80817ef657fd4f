//! Rendered-page access for scrapers.
//!
//! Scrapers never talk to the browser directly. They ask a [`PageFactory`]
//! for a fresh [`BrowserTab`] through a [`PageSession`], which owns the
//! navigation, user agent, network-idle wait, politeness delay and
//! teardown of that tab.

mod chromium;
mod config;
mod session;

pub use chromium::ChromiumBrowser;
pub use config::BrowserEngineConfig;
pub use session::{PageSession, SessionSettings, DEFAULT_USER_AGENT};

use async_trait::async_trait;

/// One browser tab, exclusively owned by a single page session.
#[async_trait]
pub trait BrowserTab: Send {
    /// Override the user agent for every request issued by this tab.
    async fn set_user_agent(&mut self, user_agent: &str) -> anyhow::Result<()>;

    /// Navigate to `url` and wait for the load event.
    async fn navigate(&mut self, url: &str) -> anyhow::Result<()>;

    /// Resolve once no network activity has been seen for a short window.
    async fn wait_for_network_idle(&mut self) -> anyhow::Result<()>;

    /// Current document HTML.
    async fn content(&mut self) -> anyhow::Result<String>;

    /// Close the tab. Closing twice is a no-op.
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Source of browser tabs. Shared by every scraper in a run.
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn new_tab(&self) -> anyhow::Result<Box<dyn BrowserTab>>;
}
