//! Scrape command: one orchestrated run.

use std::path::Path;
use std::time::Duration;

use console::style;
use tokio_util::sync::CancellationToken;

use eventradar::config::Config;
use eventradar::persistence::{persist_events, MemoryEventStore};
use eventradar::scrapers::extract::{format_currency, truncate_text};
use eventradar::{CandidateEvent, RunReport};

use crate::cli::helpers::{build_enrichment, build_orchestrator};

/// Run the selected sources once and report what they found.
pub async fn cmd_scrape(
    config: &Config,
    sources: &[String],
    enrich: bool,
    output: Option<&Path>,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config, sources).await?;
    let names = orchestrator.source_names().await;
    if names.is_empty() {
        println!("{} No sources configured.", style("!").yellow());
        return Ok(());
    }

    println!(
        "{} Scraping {} source(s): {}",
        style("→").cyan(),
        names.len(),
        names.join(", ")
    );

    let cancel = CancellationToken::new();
    let watcher = spawn_cancel_watcher(cancel.clone(), timeout.map(Duration::from_secs));
    let report = orchestrator.run_all(cancel.clone()).await;
    watcher.abort();

    if cancel.is_cancelled() {
        println!(
            "{} Run cancelled; keeping results of sources that finished",
            style("!").yellow()
        );
    }

    print_report(&report);

    let failed: Vec<&str> = report.failed_sources().map(|r| r.source.as_str()).collect();
    if !failed.is_empty() {
        println!(
            "{} {} of {} source(s) failed: {}",
            style("✗").red(),
            failed.len(),
            report.results.len(),
            failed.join(", ")
        );
    }

    let mut events = report.unique_events();
    if enrich && !events.is_empty() {
        let service = build_enrichment(config)?;
        let summary = service.enrich_batch(&mut events, usize::MAX).await;
        println!(
            "{} Enriched {} of {} events",
            style("✓").green(),
            summary.processed,
            summary.total
        );
    }

    let store = MemoryEventStore::new();
    let persisted = persist_events(&store, &events).await;
    println!(
        "{} {} unique events ({} duplicates, {} rejected)",
        style("✓").green(),
        persisted.inserted,
        persisted.duplicates,
        persisted.failed
    );

    print_events(&store.all().await);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&store.all().await)?;
        tokio::fs::write(path, json).await?;
        println!("{} Wrote {}", style("✓").green(), path.display());
    }

    Ok(())
}

/// Cancel the run on Ctrl-C or once `timeout` elapses.
fn spawn_cancel_watcher(
    cancel: CancellationToken,
    timeout: Option<Duration>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(t) => tokio::time::sleep(t).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, cancelling run");
            }
            _ = deadline => {
                tracing::warn!("Run timeout reached, cancelling");
            }
        }
        cancel.cancel();
    })
}

fn print_report(report: &RunReport) {
    println!("\n{}", style("Sources").bold());
    println!("{}", "-".repeat(64));
    println!("{:<24} {:<8} {:>8} {:>10}  Error", "Name", "Status", "Events", "Time");
    println!("{}", "-".repeat(64));

    for result in &report.results {
        let status = if result.is_success() {
            style("ok").green()
        } else {
            style("failed").red()
        };
        let error = result
            .failure()
            .map(|f| format!("{}: {}", f.kind, truncate_text(&f.message, 60)))
            .unwrap_or_default();
        println!(
            "{:<24} {:<8} {:>8} {:>9.1}s  {}",
            truncate_text(&result.source, 24),
            status,
            result.events().len(),
            result.elapsed.as_secs_f64(),
            error
        );
    }
    println!("{}", "-".repeat(64));
}

/// Most events listed before the output is cut short.
const MAX_LISTED_EVENTS: usize = 20;

fn print_events(events: &[CandidateEvent]) {
    if events.is_empty() {
        return;
    }
    println!("\n{}", style("Events").bold());
    println!("{}", "-".repeat(72));
    for event in events.iter().take(MAX_LISTED_EVENTS) {
        println!(
            "{:<16} {:<36} {:>14}",
            event.start_time.format("%d/%m/%Y %H:%M").to_string(),
            truncate_text(&event.title, 36),
            price_label(event)
        );
    }
    if events.len() > MAX_LISTED_EVENTS {
        println!("... and {} more", events.len() - MAX_LISTED_EVENTS);
    }
}

fn price_label(event: &CandidateEvent) -> String {
    match event.price {
        _ if event.is_free => "Grátis".to_string(),
        Some(price) => format_currency(price),
        None => "-".to_string(),
    }
}
