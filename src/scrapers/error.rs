//! Scraper error types.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single source's scrape.
///
/// The orchestrator turns any of these into a per-source failure; it never
/// aborts the run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to acquire browser page: {0}")]
    ResourceAcquisition(String),

    #[error("navigation to {url} timed out after {}s", timeout.as_secs_f64())]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("extraction from {url} failed: {reason}")]
    Extraction { url: String, reason: String },

    #[error("run cancelled before visiting {0}")]
    Cancelled(String),

    #[error("page session already open on {0}")]
    SessionAlreadyOpen(String),

    #[error("page session is not open")]
    SessionNotOpen,
}

impl ScrapeError {
    pub fn extraction(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Extraction {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable kind, used in run statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ResourceAcquisition(_) => "resource_acquisition",
            Self::NavigationTimeout { .. } => "navigation_timeout",
            Self::Navigation { .. } => "navigation",
            Self::Extraction { .. } => "extraction",
            Self::Cancelled(_) => "cancelled",
            Self::SessionAlreadyOpen(_) => "session_already_open",
            Self::SessionNotOpen => "session_not_open",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_url() {
        let err = ScrapeError::NavigationTimeout {
            url: "https://a.test/".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(
            err.to_string(),
            "navigation to https://a.test/ timed out after 30s"
        );
        assert_eq!(err.kind(), "navigation_timeout");
    }
}
