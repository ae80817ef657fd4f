//! Chromium-backed page factory (CDP via chromiumoxide).

use super::BrowserEngineConfig;
#[cfg(not(feature = "browser"))]
use super::{BrowserTab, PageFactory};

#[cfg(feature = "browser")]
pub use imp::ChromiumBrowser;

#[cfg(feature = "browser")]
mod imp {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use async_trait::async_trait;
    use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
    use chromiumoxide::{Browser, BrowserConfig, Page};
    use futures::StreamExt;
    use tokio::sync::Mutex;
    use tracing::{debug, info};

    use super::super::{BrowserTab, PageFactory};
    use super::BrowserEngineConfig;

    /// Resolves once the number of loaded resources has been stable for
    /// 500ms after the load event.
    const NETWORK_IDLE_SCRIPT: &str = r#"
        new Promise((resolve) => {
            const quietMs = 500;
            let last = performance.getEntriesByType('resource').length;
            let stableSince = Date.now();
            const tick = () => {
                const now = performance.getEntriesByType('resource').length;
                if (now !== last) {
                    last = now;
                    stableSince = Date.now();
                }
                if (document.readyState === 'complete' && Date.now() - stableSince >= quietMs) {
                    resolve(now);
                } else {
                    setTimeout(tick, 100);
                }
            };
            tick();
        })
    "#;

    /// Shared Chromium instance, launched lazily on the first tab request.
    pub struct ChromiumBrowser {
        config: BrowserEngineConfig,
        browser: Mutex<Option<Arc<Mutex<Browser>>>>,
    }

    impl ChromiumBrowser {
        /// Common Chrome executable paths to check.
        const CHROME_PATHS: &'static [&'static str] = &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];

        pub fn new(config: BrowserEngineConfig) -> Self {
            Self {
                config,
                browser: Mutex::new(None),
            }
        }

        fn find_chrome() -> Result<PathBuf> {
            for path in Self::CHROME_PATHS {
                let p = std::path::Path::new(path);
                if p.exists() {
                    info!("Found Chrome at: {}", path);
                    return Ok(p.to_path_buf());
                }
            }

            for cmd in [
                "google-chrome",
                "google-chrome-stable",
                "chromium",
                "chromium-browser",
            ] {
                if let Ok(path) = which::which(cmd) {
                    info!("Found Chrome in PATH: {}", path.display());
                    return Ok(path);
                }
            }

            Err(anyhow::anyhow!(
                "Chrome/Chromium not found. Install chromium or set BROWSER_REMOTE_URL"
            ))
        }

        async fn launch(&self) -> Result<Browser> {
            if let Some(remote_url) = self.config.remote_url.as_deref() {
                return self.connect_remote(remote_url).await;
            }

            info!("Launching browser (headless={})", self.config.headless);
            let mut builder = BrowserConfig::builder()
                .chrome_executable(Self::find_chrome()?)
                .request_timeout(Duration::from_secs(self.config.request_timeout));

            if !self.config.headless {
                builder = builder.with_head();
            }
            if let Some(ref proxy) = self.config.proxy {
                builder = builder.arg(format!("--proxy-server={}", proxy));
            }
            builder = builder
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .arg("--no-sandbox")
                .arg("--disable-gpu");
            for arg in &self.config.chrome_args {
                builder = builder.arg(arg);
            }

            let config = builder
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;
            let (browser, mut handler) = Browser::launch(config)
                .await
                .context("Failed to launch browser")?;

            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        }

        async fn connect_remote(&self, url: &str) -> Result<Browser> {
            info!("Connecting to remote browser at {}", url);

            let http_url = url
                .replace("ws://", "http://")
                .replace("wss://", "https://");
            let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

            let resp: serde_json::Value = reqwest::Client::new()
                .get(&version_url)
                .send()
                .await
                .context("Failed to connect to remote browser")?
                .json()
                .await
                .context("Failed to parse browser version info")?;
            let ws_url = resp
                .get("webSocketDebuggerUrl")
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))?;

            let handler_config = chromiumoxide::handler::HandlerConfig {
                request_timeout: Duration::from_secs(self.config.request_timeout),
                ..Default::default()
            };
            let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
                .await
                .context("Failed to connect to remote browser")?;

            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        }

        async fn ensure_browser(&self) -> Result<Arc<Mutex<Browser>>> {
            let mut slot = self.browser.lock().await;
            if let Some(browser) = slot.as_ref() {
                return Ok(Arc::clone(browser));
            }
            let browser = Arc::new(Mutex::new(self.launch().await?));
            *slot = Some(Arc::clone(&browser));
            Ok(browser)
        }
    }

    #[async_trait]
    impl PageFactory for ChromiumBrowser {
        async fn new_tab(&self) -> Result<Box<dyn BrowserTab>> {
            let browser = self.ensure_browser().await?;
            let page = browser
                .lock()
                .await
                .new_page("about:blank")
                .await
                .context("Failed to open browser tab")?;
            Ok(Box::new(ChromiumTab { page: Some(page) }))
        }
    }

    struct ChromiumTab {
        page: Option<Page>,
    }

    impl ChromiumTab {
        fn page(&self) -> Result<&Page> {
            self.page
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("tab already closed"))
        }
    }

    #[async_trait]
    impl BrowserTab for ChromiumTab {
        async fn set_user_agent(&mut self, user_agent: &str) -> Result<()> {
            self.page()?
                .execute(SetUserAgentOverrideParams::new(user_agent.to_string()))
                .await?;
            Ok(())
        }

        async fn navigate(&mut self, url: &str) -> Result<()> {
            self.page()?.goto(url).await?;
            Ok(())
        }

        async fn wait_for_network_idle(&mut self) -> Result<()> {
            let result = self.page()?.evaluate(NETWORK_IDLE_SCRIPT.to_string()).await?;
            let resources: u64 = result.into_value().unwrap_or_default();
            debug!("Network idle after {} resources", resources);
            Ok(())
        }

        async fn content(&mut self) -> Result<String> {
            Ok(self.page()?.content().await?)
        }

        async fn close(&mut self) -> Result<()> {
            if let Some(page) = self.page.take() {
                page.close().await?;
            }
            Ok(())
        }
    }
}

/// Stand-in used when the crate is built without the `browser` feature.
#[cfg(not(feature = "browser"))]
pub struct ChromiumBrowser {
    _config: BrowserEngineConfig,
}

#[cfg(not(feature = "browser"))]
impl ChromiumBrowser {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { _config: config }
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait::async_trait]
impl PageFactory for ChromiumBrowser {
    async fn new_tab(&self) -> anyhow::Result<Box<dyn BrowserTab>> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }
}
