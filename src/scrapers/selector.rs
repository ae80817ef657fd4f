//! Configurable listing-page scraper.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use super::config::{SourceConfig, SourceConfigError};
use super::extract::{
    extract_attr, extract_price, extract_text, parse_date_with, DEFAULT_DATE_FORMATS,
};
use super::{ScrapeContext, ScrapeError, SourceScraper};
use crate::enrichment::heuristics;
use crate::models::CandidateEvent;

const FREE_MARKERS: &[&str] = &["grátis", "gratis", "gratuito", "gratuita", "free", "entrada franca"];

/// Scrapes listing pages described by a [`SourceConfig`].
///
/// Listing pages are visited in configured order, one page session each.
pub struct SelectorScraper {
    config: SourceConfig,
    listing_urls: Vec<String>,
}

impl SelectorScraper {
    pub fn new(config: SourceConfig) -> Result<Self, SourceConfigError> {
        config.validate()?;
        let listing_urls = config.listing_urls()?;
        Ok(Self {
            config,
            listing_urls,
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn listing_urls(&self) -> &[String] {
        &self.listing_urls
    }

    /// Map every item on one listing page to a candidate event.
    ///
    /// Items without a title, a link, or a parseable date are skipped.
    pub fn parse_listing(&self, page_url: &str, html: &str) -> Result<Vec<CandidateEvent>, ScrapeError> {
        let selectors = &self.config.selectors;
        let item_selector = Selector::parse(&selectors.item).map_err(|_| {
            ScrapeError::extraction(page_url, format!("invalid item selector {:?}", selectors.item))
        })?;
        let base = Url::parse(page_url).map_err(|e| ScrapeError::extraction(page_url, e.to_string()))?;

        let document = Html::parse_document(html);
        let items: Vec<ElementRef<'_>> = document.select(&item_selector).collect();
        if items.is_empty() {
            return Err(ScrapeError::extraction(
                page_url,
                format!("no items match {:?}", selectors.item),
            ));
        }

        let mut events = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match self.parse_item(item, &base) {
                Some(event) => events.push(event),
                None => debug!("Skipped item {} on {}", index, page_url),
            }
        }
        Ok(events)
    }

    fn parse_item(&self, item: ElementRef<'_>, base: &Url) -> Option<CandidateEvent> {
        let selectors = &self.config.selectors;

        let Some(title) = extract_text(item, Some(&selectors.title)) else {
            warn!("{}: item without title", self.config.name);
            return None;
        };
        let Some(link) = self.item_link(item, base) else {
            warn!("{}: item {:?} without link", self.config.name, title);
            return None;
        };
        let start_time = self.item_date(item, &selectors.date)?;

        let description = selectors
            .description
            .as_deref()
            .and_then(|s| extract_text(item, Some(s)));
        let venue = selectors
            .venue
            .as_deref()
            .and_then(|s| extract_text(item, Some(s)))
            .or_else(|| self.config.venue.clone())
            .unwrap_or_default();

        let category = self.config.category.unwrap_or_else(|| {
            heuristics::classify(&title, description.as_deref().unwrap_or(""))
        });

        let mut event = CandidateEvent::new(
            title,
            start_time,
            venue,
            self.config.city.clone(),
            self.config.region.clone(),
            link,
            self.config.name.clone(),
        )
        .with_category(category);

        if let Some(description) = description {
            event = event.with_description(description);
        }
        if let Some(end) = selectors
            .end_date
            .as_deref()
            .and_then(|s| self.item_date(item, s))
        {
            event = event.with_end_time(end);
        }
        if let Some(address) = selectors
            .address
            .as_deref()
            .and_then(|s| extract_text(item, Some(s)))
        {
            event = event.with_address(address);
        }
        if let Some(price_text) = selectors
            .price
            .as_deref()
            .and_then(|s| extract_text(item, Some(s)))
        {
            let lowered = price_text.to_lowercase();
            if FREE_MARKERS.iter().any(|m| lowered.contains(m)) {
                event = event.mark_free();
            } else if let Some(price) = extract_price(&price_text) {
                event = event.with_price(price);
            }
        }
        if let Some(image) = selectors
            .image
            .as_deref()
            .and_then(|s| extract_attr(item, "src", Some(s)))
            .and_then(|src| base.join(&src).ok())
        {
            event = event.with_image_url(image.to_string());
        }

        Some(event)
    }

    fn item_link(&self, item: ElementRef<'_>, base: &Url) -> Option<String> {
        let href = match self.config.selectors.link.as_deref() {
            Some(selector) => extract_attr(item, "href", Some(selector))
                .or_else(|| extract_attr(item, "href", None)),
            None => extract_attr(item, "href", None),
        }?;
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }
        base.join(&href).ok().map(|u| u.to_string())
    }

    /// Date of an item, preferring a machine-readable `datetime` attribute.
    fn item_date(&self, item: ElementRef<'_>, selector: &str) -> Option<chrono::NaiveDateTime> {
        let formats: Vec<&str> = self
            .config
            .date_formats
            .iter()
            .map(String::as_str)
            .chain(DEFAULT_DATE_FORMATS.iter().copied())
            .collect();

        if let Some(dt) = extract_attr(item, "datetime", Some(selector))
            .and_then(|raw| parse_date_with(&raw, &formats))
        {
            return Some(dt);
        }
        let raw = extract_text(item, Some(selector))?;
        parse_date_with(&raw, &formats)
    }
}

#[async_trait]
impl SourceScraper for SelectorScraper {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn request_delay(&self) -> Option<Duration> {
        self.config.delay()
    }

    async fn scrape_events(&self, ctx: &ScrapeContext) -> Result<Vec<CandidateEvent>, ScrapeError> {
        let mut events = Vec::new();
        for url in &self.listing_urls {
            let html = ctx.fetch_html(url).await?;
            let page_events = self.parse_listing(url, &html)?;
            info!("{}: {} events from {}", self.config.name, page_events.len(), url);
            events.extend(page_events);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::scrapers::config::SelectorConfig;
    use rust_decimal::Decimal;

    const LISTING: &str = r#"
        <html><body>
          <article class="evento">
            <h2>Show de Rock na Praça</h2>
            <p class="desc">Banda local toca clássicos.</p>
            <time datetime="2025-05-10T20:00:00">10 de maio</time>
            <span class="local">Praça Central</span>
            <span class="preco">R$ 40,00</span>
            <a href="/eventos/rock">detalhes</a>
            <img src="img/rock.jpg">
          </article>
          <article class="evento">
            <h2>Feira de Tecnologia</h2>
            <time>12/05/2025</time>
            <span class="preco">Entrada gratuita</span>
            <a href="https://outro.test/feira">detalhes</a>
          </article>
          <article class="evento">
            <h2>Sem data</h2>
            <time>em breve</time>
            <a href="/eventos/sem-data">detalhes</a>
          </article>
          <article class="evento">
            <time>13/05/2025</time>
            <a href="/eventos/sem-titulo">detalhes</a>
          </article>
        </body></html>
    "#;

    fn config() -> SourceConfig {
        SourceConfig {
            name: "agenda".to_string(),
            base_url: "https://agenda.test/".to_string(),
            listing_paths: vec!["/lista/".to_string()],
            selectors: SelectorConfig {
                item: "article.evento".to_string(),
                title: "h2".to_string(),
                date: "time".to_string(),
                link: Some("a".to_string()),
                description: Some("p.desc".to_string()),
                end_date: None,
                venue: Some("span.local".to_string()),
                address: None,
                price: Some("span.preco".to_string()),
                image: Some("img".to_string()),
            },
            venue: Some("A definir".to_string()),
            city: "Recife".to_string(),
            region: "PE".to_string(),
            date_formats: Vec::new(),
            delay_secs: None,
            category: None,
        }
    }

    #[test]
    fn test_parse_listing_maps_items() {
        let scraper = SelectorScraper::new(config()).unwrap();
        let events = scraper
            .parse_listing("https://agenda.test/lista/", LISTING)
            .unwrap();
        assert_eq!(events.len(), 2);

        let rock = &events[0];
        assert_eq!(rock.title, "Show de Rock na Praça");
        assert_eq!(rock.source_url, "https://agenda.test/eventos/rock");
        assert_eq!(rock.start_time.to_string(), "2025-05-10 20:00:00");
        assert_eq!(rock.venue_name, "Praça Central");
        assert_eq!(rock.price, Some(Decimal::new(40, 0)));
        assert!(!rock.is_free);
        assert_eq!(rock.category, Category::Music);
        assert_eq!(
            rock.image_url.as_deref(),
            Some("https://agenda.test/lista/img/rock.jpg")
        );
        assert_eq!(rock.source_name, "agenda");
        assert_eq!(rock.city, "Recife");

        let feira = &events[1];
        assert_eq!(feira.source_url, "https://outro.test/feira");
        assert!(feira.is_free);
        assert!(feira.price.is_none());
        assert_eq!(feira.venue_name, "A definir");
        assert_eq!(feira.category, Category::Technology);
    }

    #[test]
    fn test_page_without_items_is_extraction_error() {
        let scraper = SelectorScraper::new(config()).unwrap();
        let err = scraper
            .parse_listing("https://agenda.test/lista/", "<html><body></body></html>")
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction { .. }));
    }

    #[test]
    fn test_fixed_category_wins() {
        let mut cfg = config();
        cfg.category = Some(Category::Culture);
        let scraper = SelectorScraper::new(cfg).unwrap();
        let events = scraper
            .parse_listing("https://agenda.test/lista/", LISTING)
            .unwrap();
        assert!(events.iter().all(|e| e.category == Category::Culture));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut cfg = config();
        cfg.selectors.item = "article[".to_string();
        assert!(SelectorScraper::new(cfg).is_err());
    }
}
