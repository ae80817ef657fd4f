//! Fixture source that emits demonstration events without a browser.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use tracing::debug;

use super::{ScrapeContext, ScrapeError, SourceScraper};
use crate::models::{CandidateEvent, Category};

struct Fixture {
    title: &'static str,
    description: &'static str,
    venue: &'static str,
    city: &'static str,
    region: &'static str,
    address: &'static str,
    /// Price in cents; zero means free.
    price_cents: i64,
    category: Category,
    /// Offset from the base date: days, hour of day, minute, duration in hours.
    schedule: (i64, i64, i64, i64),
}

const FIXTURES: [Fixture; 5] = [
    Fixture {
        title: "Festival de Música Eletrônica",
        description: "O maior festival de música eletrônica da região com os melhores DJs nacionais e internacionais.",
        venue: "Parque Ibirapuera",
        city: "São Paulo",
        region: "SP",
        address: "Av. Pedro Álvares Cabral, s/n - Vila Mariana",
        price_cents: 15000,
        category: Category::Music,
        schedule: (3, 20, 0, 6),
    },
    Fixture {
        title: "Workshop de Python para Iniciantes",
        description: "Aprenda Python do zero com projetos práticos e mentoria especializada.",
        venue: "Centro de Convenções",
        city: "Mauá",
        region: "SP",
        address: "Rua da Tecnologia, 123 - Centro",
        price_cents: 0,
        category: Category::Technology,
        schedule: (5, 9, 30, 4),
    },
    Fixture {
        title: "Exposição de Arte Contemporânea",
        description: "Mostra com obras de artistas brasileiros contemporâneos.",
        venue: "Museu de Arte Moderna",
        city: "São Paulo",
        region: "SP",
        address: "Av. Paulista, 1578 - Bela Vista",
        price_cents: 2500,
        category: Category::Culture,
        schedule: (10, 14, 0, 3),
    },
    Fixture {
        title: "Corrida de Rua 5K",
        description: "Corrida beneficente com percurso de 5km pela cidade.",
        venue: "Parque da Cidade",
        city: "Mauá",
        region: "SP",
        address: "Av. dos Esportes, 456 - Jardim Mauá",
        price_cents: 3000,
        category: Category::Sports,
        schedule: (14, 7, 0, 2),
    },
    Fixture {
        title: "Degustação de Vinhos",
        description: "Degustação de vinhos nacionais com sommelier especializado.",
        venue: "Restaurante Gourmet",
        city: "São Paulo",
        region: "SP",
        address: "Rua Augusta, 789 - Consolação",
        price_cents: 8000,
        category: Category::Food,
        schedule: (21, 19, 30, 3),
    },
];

/// Emits five fixed demonstration events, starting a week from now.
pub struct ExampleScraper {
    name: String,
    base_url: String,
}

impl ExampleScraper {
    pub const NAME: &'static str = "exemplo";
    pub const BASE_URL: &'static str = "https://exemplo.com";

    pub fn new() -> Self {
        Self {
            name: Self::NAME.to_string(),
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Build the fixture events relative to `now`.
    pub fn events_at(&self, now: NaiveDateTime) -> Vec<CandidateEvent> {
        let base_date = (now + TimeDelta::days(7)).date();

        FIXTURES
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                let (days, hour, minute, hours_long) = f.schedule;
                let start = base_date.and_hms_opt(0, 0, 0)?
                    + TimeDelta::days(days)
                    + TimeDelta::hours(hour)
                    + TimeDelta::minutes(minute);

                let event = CandidateEvent::new(
                    f.title,
                    start,
                    f.venue,
                    f.city,
                    f.region,
                    format!("{}/evento/{}", self.base_url, i + 1),
                    "exemplo.com",
                )
                .with_description(f.description)
                .with_end_time(start + TimeDelta::hours(hours_long))
                .with_address(f.address)
                .with_price(Decimal::new(f.price_cents, 2))
                .with_category(f.category)
                .with_tags(["exemplo", "demonstração", "teste"]);
                Some(event)
            })
            .collect()
    }
}

impl Default for ExampleScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceScraper for ExampleScraper {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_delay(&self) -> Option<Duration> {
        Some(Duration::from_millis(500))
    }

    async fn scrape_events(&self, ctx: &ScrapeContext) -> Result<Vec<CandidateEvent>, ScrapeError> {
        if ctx.is_cancelled() {
            return Err(ScrapeError::Cancelled(self.base_url.clone()));
        }
        let events = self.events_at(Local::now().naive_local());
        debug!("{} produced {} fixture events", self.name, events.len());
        Ok(events)
    }
}
