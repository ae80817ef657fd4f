//! AI enrichment commands.

use console::style;
use serde_json::json;

use eventradar::config::Config;
use eventradar::llm::LlmClient;

use crate::cli::helpers::build_enrichment;

/// Enrich a single title/description pair and print the results as JSON.
pub async fn cmd_enrich(config: &Config, title: &str, description: &str) -> anyhow::Result<()> {
    let service = build_enrichment(config)?;

    let category = service.classify_type(title, description).await;
    let summary = service.summarize(title, description).await;
    let keywords = service.extract_keywords(title, description).await;
    let sentiment = service.analyze_sentiment(title, description).await;

    let result = json!({
        "title": title,
        "category": category,
        "summary": summary,
        "keywords": keywords,
        "sentiment": sentiment,
    });
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Show whether the AI backend answers, and which model it would use.
pub async fn cmd_ai_status(config: &Config) -> anyhow::Result<()> {
    let service = build_enrichment(config)?;
    let status = service.status().await;

    println!("\n{}", style("AI Backend").bold());
    println!("{}", "-".repeat(40));
    let state = if status.available {
        style("available").green()
    } else if !config.llm.enabled {
        style("disabled").yellow()
    } else {
        style("unreachable").red()
    };
    println!("{:<12} {}", "Status:", state);
    println!("{:<12} {}", "Model:", status.model);
    println!("{:<12} {}", "Endpoint:", status.endpoint);

    if status.available {
        let client = LlmClient::new(config.llm.clone())?;
        match client.list_models().await {
            Ok(models) if models.is_empty() => {
                println!("{:<12} {}", "Models:", style("none pulled").yellow())
            }
            Ok(models) => {
                println!("{:<12} {}", "Models:", models.join(", "));
                let pulled = models
                    .iter()
                    .any(|m| *m == status.model || m.split(':').next() == Some(status.model.as_str()));
                if !pulled {
                    println!(
                        "\n{} Model '{}' is not pulled. Run: ollama pull {}",
                        style("!").yellow(),
                        status.model,
                        status.model
                    );
                }
            }
            Err(e) => println!("{:<12} {}", "Models:", style(e).red()),
        }
    }

    if !status.available {
        println!(
            "\n{} Enrichment falls back to keyword heuristics.",
            style("!").yellow()
        );
    }
    Ok(())
}
