//! Listing-page source configuration.
//!
//! A [`SourceConfig`] describes one site well enough for a
//! [`SelectorScraper`](super::SelectorScraper) to turn its listing pages into
//! candidate events: where the listings live and which CSS selectors pick
//! out each field.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::Category;

/// One configurable listing-page source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source name.
    pub name: String,
    /// Site root; listing paths and relative links resolve against it.
    pub base_url: String,
    /// Listing pages, relative to `base_url` or absolute. Empty means the
    /// base URL itself.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listing_paths: Vec<String>,
    pub selectors: SelectorConfig,
    /// Venue used when an item carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    /// Date formats tried before the defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_formats: Vec<String>,
    /// Politeness delay override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_secs: Option<f64>,
    /// Fixed category for every event; keyword classification otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// CSS selectors, evaluated relative to each listing item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Selects each event card on a listing page (document-relative).
    pub item: String,
    pub title: String,
    pub date: String,
    #[serde(default = "default_link", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn default_link() -> Option<String> {
    Some("a".to_string())
}

/// Reasons a source configuration is unusable.
#[derive(Debug, thiserror::Error)]
pub enum SourceConfigError {
    #[error("source name must not be empty")]
    EmptyName,
    #[error("source {name}: invalid URL {url}: {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },
    #[error("source {name}: invalid selector {selector:?}")]
    InvalidSelector { name: String, selector: String },
}

impl SourceConfig {
    /// Absolute listing URLs, in visiting order.
    pub fn listing_urls(&self) -> Result<Vec<String>, SourceConfigError> {
        let base = Url::parse(&self.base_url).map_err(|e| SourceConfigError::InvalidUrl {
            name: self.name.clone(),
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if self.listing_paths.is_empty() {
            return Ok(vec![base.to_string()]);
        }

        self.listing_paths
            .iter()
            .map(|path| {
                base.join(path)
                    .map(|u| u.to_string())
                    .map_err(|e| SourceConfigError::InvalidUrl {
                        name: self.name.clone(),
                        url: path.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect()
    }

    /// Politeness delay override, if configured.
    pub fn delay(&self) -> Option<std::time::Duration> {
        self.delay_secs
            .and_then(|s| std::time::Duration::try_from_secs_f64(s).ok())
    }

    /// Check the name, URLs and every selector.
    pub fn validate(&self) -> Result<(), SourceConfigError> {
        if self.name.trim().is_empty() {
            return Err(SourceConfigError::EmptyName);
        }
        self.listing_urls()?;

        let s = &self.selectors;
        let required = [&s.item, &s.title, &s.date];
        let optional = [
            &s.link,
            &s.description,
            &s.end_date,
            &s.venue,
            &s.address,
            &s.price,
            &s.image,
        ];
        for selector in required
            .into_iter()
            .chain(optional.into_iter().flatten())
        {
            if scraper::Selector::parse(selector).is_err() {
                return Err(SourceConfigError::InvalidSelector {
                    name: self.name.clone(),
                    selector: selector.clone(),
                });
            }
        }
        Ok(())
    }
}
