//! Configuration management for EventRadar using the prefer crate.
//!
//! `prefer` discovers an `eventradar.{toml,yaml,json}` file in the usual
//! places; the file is parsed with serde according to its extension.
//! Environment variables override whatever the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmConfig;
use crate::scrapers::browser::DEFAULT_USER_AGENT;
use crate::scrapers::{BrowserEngineConfig, SessionSettings, SourceConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {format} config {path}: {message}")]
    Parse {
        format: &'static str,
        path: PathBuf,
        message: String,
    },
}

/// Page-session timing and identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Politeness delay after each page load, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_delay_secs() -> f64 {
    1.0
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl ScrapingConfig {
    /// Apply `SCRAPER_DELAY_SECS` and `SCRAPER_USER_AGENT`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("SCRAPER_DELAY_SECS") {
            if let Ok(secs) = val.parse::<f64>() {
                self.delay_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("SCRAPER_USER_AGENT") {
            if !val.trim().is_empty() {
                self.user_agent = val;
            }
        }
        self
    }

    pub fn session_settings(&self) -> SessionSettings {
        let delay = Duration::try_from_secs_f64(self.delay_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_delay_secs()));
        SessionSettings {
            user_agent: self.user_agent.clone(),
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            delay,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "LlmConfig::base_default")]
    pub llm: LlmConfig,
    #[serde(default)]
    pub scraping: ScrapingConfig,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    /// Register the built-in demonstration source.
    #[serde(default = "default_include_example_source")]
    pub include_example_source: bool,
    /// Configurable listing-page sources.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    /// File this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_include_example_source() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::base_default(),
            scraping: ScrapingConfig::default(),
            browser: BrowserEngineConfig::default(),
            include_example_source: default_include_example_source(),
            sources: Vec::new(),
            source_path: None,
        }
    }
}

impl Config {
    /// Discover and load the config file, falling back to defaults.
    /// Environment overrides are applied either way.
    pub async fn load() -> Self {
        match prefer::load("eventradar").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}; using defaults", e);
                        Self::default_with_env()
                    }
                },
                None => Self::default_with_env(),
            },
            Err(_) => Self::default_with_env(),
        }
    }

    /// Defaults with environment overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// The format follows the extension: TOML, YAML, or JSON otherwise.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |format: &'static str, message: String| ConfigError::Parse {
            format,
            path: path.to_path_buf(),
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_err("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_err("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_err("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.llm = self.llm.with_env_overrides();
        self.scraping = self.scraping.with_env_overrides();
        self.browser = self.browser.with_env_overrides();
        self
    }
}
