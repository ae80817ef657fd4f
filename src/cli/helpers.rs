//! Shared helper functions for CLI commands.

use std::sync::Arc;

use anyhow::Context;

use eventradar::config::Config;
use eventradar::llm::LlmClient;
use eventradar::scrapers::{ChromiumBrowser, ExampleScraper, SelectorScraper, SourceScraper};
use eventradar::{EnrichmentService, Orchestrator};

/// Every source the config describes, in registration order.
pub fn configured_sources(config: &Config) -> anyhow::Result<Vec<Arc<dyn SourceScraper>>> {
    let mut sources: Vec<Arc<dyn SourceScraper>> = Vec::new();
    if config.include_example_source {
        sources.push(Arc::new(ExampleScraper::new()));
    }
    for source in &config.sources {
        let scraper = SelectorScraper::new(source.clone())
            .with_context(|| format!("invalid source '{}'", source.name))?;
        sources.push(Arc::new(scraper));
    }
    Ok(sources)
}

/// Keep only the named sources. An empty selection keeps everything.
pub fn select_sources(
    sources: Vec<Arc<dyn SourceScraper>>,
    selected: &[String],
) -> anyhow::Result<Vec<Arc<dyn SourceScraper>>> {
    if selected.is_empty() {
        return Ok(sources);
    }
    if let Some(unknown) = selected
        .iter()
        .find(|name| !sources.iter().any(|s| s.name() == name.as_str()))
    {
        anyhow::bail!("unknown source '{}'", unknown);
    }
    Ok(sources
        .into_iter()
        .filter(|s| selected.iter().any(|name| name == s.name()))
        .collect())
}

/// Orchestrator over a Chromium page factory with the selected sources
/// registered.
pub async fn build_orchestrator(config: &Config, selected: &[String]) -> anyhow::Result<Orchestrator> {
    let pages = Arc::new(ChromiumBrowser::new(config.browser.clone()));
    let orchestrator = Orchestrator::new(pages, config.scraping.session_settings());
    for scraper in select_sources(configured_sources(config)?, selected)? {
        orchestrator.add_scraper(scraper).await?;
    }
    Ok(orchestrator)
}

pub fn build_enrichment(config: &Config) -> anyhow::Result<EnrichmentService> {
    let client = LlmClient::new(config.llm.clone()).context("failed to build LLM client")?;
    Ok(EnrichmentService::new(Arc::new(client)))
}
