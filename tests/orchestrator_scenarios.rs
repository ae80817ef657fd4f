//! End-to-end orchestrator runs against in-process scrapers and a fake
//! browser.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Barrier, Notify};
use tokio_util::sync::CancellationToken;

use eventradar::scrapers::{
    BrowserTab, ExampleScraper, PageFactory, SelectorConfig, SelectorScraper, SessionSettings,
    SourceConfig,
};
use eventradar::{
    CandidateEvent, Orchestrator, RegistryError, RunState, ScrapeContext, ScrapeError,
    SourceScraper,
};

fn event(source: &str, url: &str) -> CandidateEvent {
    let start = NaiveDate::from_ymd_opt(2025, 3, 15)
        .unwrap()
        .and_hms_opt(20, 0, 0)
        .unwrap();
    CandidateEvent::new(
        format!("{} event", source),
        start,
        "Teatro",
        "Recife",
        "PE",
        url,
        source,
    )
}

enum Behavior {
    Emit(Vec<CandidateEvent>),
    Fail,
    Panic,
    WaitForCancel,
    WaitAtBarrier(Arc<Barrier>, Vec<CandidateEvent>),
    WaitForNotify(Arc<Notify>),
}

struct FakeScraper {
    name: String,
    behavior: Behavior,
}

impl FakeScraper {
    fn new(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
        })
    }

    fn emitting(name: &str, count: usize) -> Arc<Self> {
        let events = (0..count)
            .map(|i| event(name, &format!("https://{}.test/{}", name, i)))
            .collect();
        Self::new(name, Behavior::Emit(events))
    }
}

#[async_trait]
impl SourceScraper for FakeScraper {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        "https://fake.test"
    }

    async fn scrape_events(&self, ctx: &ScrapeContext) -> Result<Vec<CandidateEvent>, ScrapeError> {
        match &self.behavior {
            Behavior::Emit(events) => Ok(events.clone()),
            Behavior::Fail => Err(ScrapeError::extraction(
                "https://fake.test",
                "no element matches the item selector",
            )),
            Behavior::Panic => panic!("scraper bug"),
            Behavior::WaitForCancel => {
                ctx.cancel_token().cancelled().await;
                Err(ScrapeError::Cancelled(self.name.clone()))
            }
            Behavior::WaitAtBarrier(barrier, events) => {
                barrier.wait().await;
                Ok(events.clone())
            }
            Behavior::WaitForNotify(notify) => {
                notify.notified().await;
                Ok(Vec::new())
            }
        }
    }
}

/// Serves canned HTML per URL; unknown URLs fail to navigate.
struct FakePages {
    pages: HashMap<String, String>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FakePages {
    fn new(pages: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .iter()
                .map(|(url, html)| (url.to_string(), html.to_string()))
                .collect(),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn empty() -> Arc<Self> {
        Self::new(&[])
    }
}

struct FakeTab {
    pages: HashMap<String, String>,
    current: Option<String>,
    closed: Arc<AtomicUsize>,
    is_closed: bool,
}

#[async_trait]
impl BrowserTab for FakeTab {
    async fn set_user_agent(&mut self, _user_agent: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> anyhow::Result<()> {
        match self.pages.get(url) {
            Some(html) => {
                self.current = Some(html.clone());
                Ok(())
            }
            None => anyhow::bail!("net::ERR_NAME_NOT_RESOLVED"),
        }
    }

    async fn wait_for_network_idle(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn content(&mut self) -> anyhow::Result<String> {
        self.current
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no document"))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if !self.is_closed {
            self.is_closed = true;
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[async_trait]
impl PageFactory for FakePages {
    async fn new_tab(&self) -> anyhow::Result<Box<dyn BrowserTab>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeTab {
            pages: self.pages.clone(),
            current: None,
            closed: Arc::clone(&self.closed),
            is_closed: false,
        }))
    }
}

fn settings() -> SessionSettings {
    SessionSettings::default().with_delay(Duration::ZERO)
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(FakePages::empty(), settings())
}

#[tokio::test]
async fn test_failing_source_is_isolated() {
    let orch = orchestrator();
    orch.add_scraper(FakeScraper::new("broken", Behavior::Fail))
        .await
        .unwrap();
    orch.add_scraper(FakeScraper::emitting("good", 5)).await.unwrap();

    let report = orch.run_all(CancellationToken::new()).await;
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].source, "broken");
    let failure = report.results[0].failure().unwrap();
    assert_eq!(failure.kind, "extraction");
    assert!(failure.message.contains("item selector"));

    let all = orch.get_all_events().await;
    assert_eq!(all.len(), 5);
    assert!(all.iter().all(|e| e.source_name == "good"));

    let stats = orch.stats().await;
    assert_eq!(stats.sources_registered, 2);
    assert_eq!(stats.sources_executed, 2);
    assert_eq!(stats.total_events, 5);
    assert_eq!(stats.events_by_source["broken"], 0);
    assert_eq!(stats.events_by_source["good"], 5);
    assert!(stats.failures.contains_key("broken"));
    assert!(stats.last_run.is_some());
}

#[tokio::test]
async fn test_totals_across_many_sources() {
    let orch = orchestrator();
    for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
        orch.add_scraper(FakeScraper::emitting(name, i + 1))
            .await
            .unwrap();
    }

    orch.run_all(CancellationToken::new()).await;
    let stats = orch.stats().await;
    assert_eq!(stats.total_events, 1 + 2 + 3 + 4);
    assert_eq!(stats.total_events, stats.events_by_source.values().sum::<usize>());

    // registration order, then emission order
    let sources: Vec<String> = orch
        .get_all_events()
        .await
        .into_iter()
        .map(|e| e.source_name)
        .collect();
    assert_eq!(sources, ["a", "b", "b", "c", "c", "c", "d", "d", "d", "d"]);

    assert_eq!(orch.get_events_by_source("c").await.len(), 3);
    assert!(orch.get_events_by_source("unknown").await.is_empty());
}

#[tokio::test]
async fn test_duplicate_urls_across_sources() {
    let orch = orchestrator();
    orch.add_scraper(FakeScraper::new(
        "first",
        Behavior::Emit(vec![event("first", "https://shared.test/1")]),
    ))
    .await
    .unwrap();
    orch.add_scraper(FakeScraper::new(
        "second",
        Behavior::Emit(vec![
            event("second", "https://shared.test/1"),
            event("second", "https://shared.test/2"),
        ]),
    ))
    .await
    .unwrap();

    orch.run_all(CancellationToken::new()).await;
    assert_eq!(orch.get_all_events().await.len(), 3);

    let unique = orch.unique_events().await;
    assert_eq!(unique.len(), 2);
    assert_eq!(unique[0].source_name, "first");
    assert_eq!(unique[1].source_url, "https://shared.test/2");
}

#[tokio::test]
async fn test_sources_run_concurrently() {
    let barrier = Arc::new(Barrier::new(2));
    let orch = orchestrator();
    orch.add_scraper(FakeScraper::new(
        "left",
        Behavior::WaitAtBarrier(Arc::clone(&barrier), vec![event("left", "https://l/1")]),
    ))
    .await
    .unwrap();
    orch.add_scraper(FakeScraper::new(
        "right",
        Behavior::WaitAtBarrier(Arc::clone(&barrier), vec![event("right", "https://r/1")]),
    ))
    .await
    .unwrap();

    // Sequential execution would deadlock on the barrier.
    let report = tokio::time::timeout(Duration::from_secs(5), orch.run_all(CancellationToken::new()))
        .await
        .expect("sources did not run concurrently");
    assert_eq!(report.events().len(), 2);
}

#[tokio::test]
async fn test_cancellation_keeps_finished_results() {
    let orch = orchestrator();
    orch.add_scraper(FakeScraper::emitting("fast", 2)).await.unwrap();
    orch.add_scraper(FakeScraper::new("slow", Behavior::WaitForCancel))
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), orch.run_all(cancel))
        .await
        .unwrap();
    assert_eq!(report.events_for("fast").len(), 2);
    assert_eq!(
        report.result_for("slow").unwrap().failure().unwrap().kind,
        "cancelled"
    );
    assert_eq!(orch.stats().await.total_events, 2);
}

#[tokio::test]
async fn test_panicking_source_is_recorded() {
    let orch = orchestrator();
    orch.add_scraper(FakeScraper::new("buggy", Behavior::Panic))
        .await
        .unwrap();
    orch.add_scraper(FakeScraper::emitting("fine", 1)).await.unwrap();

    let report = orch.run_all(CancellationToken::new()).await;
    assert_eq!(report.result_for("buggy").unwrap().failure().unwrap().kind, "panic");
    assert_eq!(report.events_for("fine").len(), 1);
    assert_eq!(orch.state().await, RunState::Completed);
}

#[tokio::test]
async fn test_duplicate_names_rejected() {
    let orch = orchestrator();
    orch.add_scraper(FakeScraper::emitting("dup", 1)).await.unwrap();
    let err = orch
        .add_scraper(FakeScraper::emitting("dup", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateName(ref name) if name == "dup"));
    assert_eq!(orch.source_names().await, ["dup"]);
}

#[tokio::test]
async fn test_empty_registry() {
    let orch = orchestrator();
    assert_eq!(orch.state().await, RunState::Idle);
    assert_eq!(orch.stats().await.last_run, None);

    let report = orch.run_all(CancellationToken::new()).await;
    assert!(report.results.is_empty());

    let stats = orch.stats().await;
    assert_eq!(stats.sources_registered, 0);
    assert_eq!(stats.total_events, 0);
    assert!(orch.get_all_events().await.is_empty());
    assert_eq!(orch.state().await, RunState::Completed);
}

#[tokio::test]
async fn test_trigger_run_in_background() {
    let release = Arc::new(Notify::new());
    let orch = Arc::new(orchestrator());
    orch.add_scraper(FakeScraper::new(
        "gated",
        Behavior::WaitForNotify(Arc::clone(&release)),
    ))
    .await
    .unwrap();
    orch.add_scraper(FakeScraper::emitting("quick", 3)).await.unwrap();

    let names = orch.trigger_run(CancellationToken::new()).await;
    assert_eq!(names, ["gated", "quick"]);
    assert_eq!(orch.state().await, RunState::Running);
    // nothing is published before every source finishes
    assert!(orch.get_all_events().await.is_empty());

    release.notify_one();
    tokio::time::timeout(Duration::from_secs(5), async {
        while orch.state().await != RunState::Completed {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(orch.get_all_events().await.len(), 3);
}

#[tokio::test]
async fn test_example_source_through_orchestrator() {
    let orch = orchestrator();
    orch.add_scraper(Arc::new(ExampleScraper::new())).await.unwrap();

    orch.run_all(CancellationToken::new()).await;
    let events = orch.get_events_by_source(ExampleScraper::NAME).await;
    assert_eq!(events.len(), 5);
    assert!(events.iter().all(|e| e.validate().is_ok()));
}

const LISTING: &str = r#"
    <html><body>
      <div class="card">
        <h3>Jazz no Parque</h3>
        <time datetime="2025-06-01T18:00:00">1 de junho</time>
        <a href="/e/jazz">ver</a>
      </div>
      <div class="card">
        <h3>Maratona da Cidade</h3>
        <time>02/06/2025</time>
        <a href="/e/maratona">ver</a>
      </div>
    </body></html>
"#;

fn selector_source(name: &str, base_url: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        base_url: base_url.to_string(),
        listing_paths: vec!["/agenda".to_string()],
        selectors: SelectorConfig {
            item: "div.card".to_string(),
            title: "h3".to_string(),
            date: "time".to_string(),
            link: Some("a".to_string()),
            description: None,
            end_date: None,
            venue: None,
            address: None,
            price: None,
            image: None,
        },
        venue: Some("Centro".to_string()),
        city: "Olinda".to_string(),
        region: "PE".to_string(),
        date_formats: Vec::new(),
        delay_secs: Some(0.0),
        category: None,
    }
}

#[tokio::test]
async fn test_selector_sources_share_the_browser() {
    let pages = FakePages::new(&[("https://agenda.test/agenda", LISTING)]);
    let orch = Orchestrator::new(pages.clone(), settings());
    orch.add_scraper(Arc::new(
        SelectorScraper::new(selector_source("agenda", "https://agenda.test")).unwrap(),
    ))
    .await
    .unwrap();
    orch.add_scraper(Arc::new(
        SelectorScraper::new(selector_source("offline", "https://offline.test")).unwrap(),
    ))
    .await
    .unwrap();

    let report = orch.run_all(CancellationToken::new()).await;

    let events = report.events_for("agenda");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].source_url, "https://agenda.test/e/jazz");
    assert_eq!(events[1].start_time.to_string(), "2025-06-02 00:00:00");
    assert_eq!(events[1].venue_name, "Centro");

    let failure = report.result_for("offline").unwrap().failure().unwrap();
    assert_eq!(failure.kind, "navigation");

    // every tab opened during the run was closed, including the failed one
    assert_eq!(pages.opened.load(Ordering::SeqCst), 2);
    assert_eq!(pages.closed.load(Ordering::SeqCst), 2);
}
