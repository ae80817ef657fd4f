//! Prompts for event enrichment.
//!
//! Every prompt uses `{title}` and `{description}` placeholders.

pub const CLASSIFY_PROMPT: &str = r#"Classify the event below into exactly one category.

Title: {title}
Description: {description}

Choose ONLY one of: música, cultura, tecnologia, esporte, gastronomia, outros

Respond with the category word alone, no punctuation or explanation."#;

pub const SUMMARY_PROMPT: &str = r#"Write a concise, appealing summary of this event.

Title: {title}
Description: {description}

The summary must:
- have at most 2 sentences
- highlight the main points
- be written in the same language as the description

Respond with ONLY the summary."#;

pub const KEYWORDS_PROMPT: &str = r#"Extract the main keywords of this event.

Title: {title}
Description: {description}

Respond with ONLY the keywords, comma-separated, lowercase, at most 10."#;

pub const SENTIMENT_PROMPT: &str = r#"Analyze this event and answer in JSON.

Title: {title}
Description: {description}

Reply with a JSON object containing:
- "sentiment": "positive", "neutral" or "negative"
- "confidence": number between 0 and 1
- "main_topics": array with the 3 main topics
- "target_audience": short description of the intended audience

JSON:"#;

/// Fill the `{title}` and `{description}` placeholders.
pub fn render(template: &str, title: &str, description: &str) -> String {
    template
        .replace("{title}", title)
        .replace("{description}", description)
}
