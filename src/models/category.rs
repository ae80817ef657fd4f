//! Event category classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of event, as assigned by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Music,
    Culture,
    Technology,
    Sports,
    Food,
    /// Unclassified or no matching category.
    #[default]
    Other,
}

impl Category {
    /// Categories a classifier can assign, in precedence order.
    /// `Other` is the fallback and is not part of this list.
    pub const CLASSIFIED: [Category; 5] = [
        Category::Music,
        Category::Culture,
        Category::Technology,
        Category::Sports,
        Category::Food,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Music => "music",
            Category::Culture => "culture",
            Category::Technology => "technology",
            Category::Sports => "sports",
            Category::Food => "food",
            Category::Other => "other",
        }
    }

    /// Map a free-form label (English or Portuguese) to a category.
    ///
    /// Case and surrounding punctuation are ignored. Returns `None` for
    /// labels that name no known category.
    pub fn from_label(label: &str) -> Option<Self> {
        let cleaned = label
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();

        match cleaned.as_str() {
            "music" | "música" | "musica" => Some(Category::Music),
            "culture" | "cultura" => Some(Category::Culture),
            "technology" | "tech" | "tecnologia" => Some(Category::Technology),
            "sports" | "sport" | "esporte" | "esportes" => Some(Category::Sports),
            "food" | "gastronomy" | "gastronomia" => Some(Category::Food),
            "other" | "others" | "outros" | "outro" => Some(Category::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
