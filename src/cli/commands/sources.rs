//! Source listing command.

use console::style;

use eventradar::config::Config;
use eventradar::scrapers::extract::truncate_text;

use crate::cli::helpers::configured_sources;

/// List the sources a run would register.
pub async fn cmd_sources(config: &Config) -> anyhow::Result<()> {
    let sources = configured_sources(config)?;

    if sources.is_empty() {
        println!(
            "{} No sources configured. Add [[sources]] to eventradar.toml.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Event Sources").bold());
    println!("{}", "-".repeat(60));
    println!("{:<20} Base URL", "Name");
    println!("{}", "-".repeat(60));
    for source in sources {
        println!("{:<20} {}", truncate_text(source.name(), 19), source.base_url());
    }

    if let Some(path) = &config.source_path {
        println!("\nConfig: {}", path.display());
    }
    Ok(())
}
