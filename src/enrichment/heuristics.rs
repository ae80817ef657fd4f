//! Local enrichment rules used when the text-generation backend is
//! unavailable or returns something unusable.
//!
//! Everything here is deterministic and works on Portuguese and English
//! listings alike.

use crate::models::Category;

/// Longest fallback summary before truncation, in characters.
const SUMMARY_MAX_CHARS: usize = 200;

/// Most keywords returned by [`keywords`].
pub const MAX_KEYWORDS: usize = 10;

const MUSIC: &[&str] = &[
    "music", "show", "concert", "festival", "band", "singer", "dj", "música", "musica",
    "concerto", "banda", "cantor",
];
const CULTURE: &[&str] = &[
    "theater", "theatre", "exhibition", "museum", "art", "culture", "dance", "ballet", "teatro",
    "exposição", "museu", "arte", "cultura", "dança", "balé",
];
const TECHNOLOGY: &[&str] = &[
    "tech", "programming", "development", "startup", "hackathon", "tecnologia", "programação",
    "desenvolvimento",
];
const SPORTS: &[&str] = &[
    "soccer", "basketball", "running", "marathon", "sports", "athletics", "futebol", "basquete",
    "corrida", "maratona", "esporte", "atletismo",
];
const FOOD: &[&str] = &[
    "gastronomy", "cuisine", "chef", "restaurant", "food", "tasting", "gastronomia", "culinária",
    "restaurante", "comida", "degustação",
];

const STOP_WORDS: &[&str] = &[
    // Portuguese
    "o", "a", "os", "as", "um", "uma", "de", "da", "do", "das", "dos", "em", "na", "no", "nas",
    "nos", "para", "com", "por", "sobre", "que", "qual", "quando", "onde", "como", "se", "mas",
    "e", "ou", "ser", "estar", "ter", "fazer", "dizer", "ver", "saber", "poder", "mais", "pela",
    "pelo", "seus", "suas", "este", "esta", "isso",
    // English
    "the", "and", "for", "with", "from", "this", "that", "into", "your", "about", "will", "have",
    "are", "our", "their", "there", "what", "when", "where", "which",
];

fn keywords_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::Music => MUSIC,
        Category::Culture => CULTURE,
        Category::Technology => TECHNOLOGY,
        Category::Sports => SPORTS,
        Category::Food => FOOD,
        Category::Other => &[],
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Keyword classification: the first category, in [`Category::CLASSIFIED`]
/// order, with a keyword that starts one of the words of title and
/// description. Prefix matching catches plurals and inflections ("shows",
/// "bandas") without matching inside other words.
pub fn classify(title: &str, description: &str) -> Category {
    let text = format!("{} {}", title, description);
    let present: Vec<String> = words(&text).collect();

    Category::CLASSIFIED
        .into_iter()
        .find(|category| {
            keywords_for(*category)
                .iter()
                .any(|k| present.iter().any(|w| w.starts_with(k)))
        })
        .unwrap_or(Category::Other)
}

/// First two sentences of the description, or the description itself cut
/// at 200 characters.
pub fn summarize(description: &str) -> String {
    let description = description.trim();
    if description.is_empty() {
        return String::new();
    }

    let sentences: Vec<&str> = description
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.len() >= 2 {
        return format!("{}. {}.", sentences[0], sentences[1]);
    }

    if description.chars().count() > SUMMARY_MAX_CHARS {
        let head: String = description.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        description.to_string()
    }
}

/// Significant words of title and description, in order of appearance.
/// Repeated words are kept.
pub fn keywords(title: &str, description: &str) -> Vec<String> {
    let text = format!("{} {}", title, description).to_lowercase();

    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}
