//! Extraction helpers shared by every scraper.
//!
//! All functions here are pure: they take parsed HTML or raw strings and
//! return normalized values, never errors. Anything that cannot be parsed
//! comes back as `None`.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use scraper::{ElementRef, Selector};
use tracing::warn;

/// Date formats tried by [`parse_date`], in order.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d",
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y",
];

fn select_first<'a>(element: ElementRef<'a>, selector: Option<&str>) -> Option<ElementRef<'a>> {
    let Some(selector_str) = selector else {
        return Some(element);
    };
    let selector = match Selector::parse(selector_str) {
        Ok(s) => s,
        Err(_) => {
            warn!("Failed to parse selector: {}", selector_str);
            return None;
        }
    };
    element.select(&selector).next()
}

/// Whitespace-normalized text of `element`, or of its first descendant
/// matching `selector`. Empty text yields `None`.
pub fn extract_text(element: ElementRef<'_>, selector: Option<&str>) -> Option<String> {
    let target = select_first(element, selector)?;
    let text = normalize_text(&target.text().collect::<String>());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Attribute `attr` of `element`, or of its first descendant matching
/// `selector`.
pub fn extract_attr(element: ElementRef<'_>, attr: &str, selector: Option<&str>) -> Option<String> {
    select_first(element, selector)?
        .value()
        .attr(attr)
        .map(|v| v.trim().to_string())
}

/// Collapse every run of whitespace to a single space and trim the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a date string with [`DEFAULT_DATE_FORMATS`].
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    parse_date_with(raw, DEFAULT_DATE_FORMATS)
}

/// Parse a date string, trying each format in order.
///
/// Date-only formats resolve to midnight. Unrecognized input is logged at
/// warn level and yields `None`.
pub fn parse_date_with<S: AsRef<str>>(raw: &str, formats: &[S]) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in formats {
        let format = format.as_ref();
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    warn!("Unrecognized date format: {}", trimmed);
    None
}

/// Parse a price out of free text such as `"R$ 1.234,56"` or `"$12.50"`.
///
/// With both `.` and `,` present the right-most one is the decimal
/// separator. A lone `,` is a decimal comma. A separator that repeats is a
/// thousands separator.
pub fn extract_price(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ',');
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let decimal_sep = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        (Some(_), None) if cleaned.matches('.').count() == 1 => Some('.'),
        (None, Some(_)) if cleaned.matches(',').count() == 1 => Some(','),
        _ => None,
    };

    let normalized: String = match decimal_sep {
        Some(sep) => {
            let (int_part, frac_part) = cleaned.split_at(cleaned.rfind(sep)?);
            let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
            format!("{}.{}", int_digits, &frac_part[1..])
        }
        None => cleaned.chars().filter(char::is_ascii_digit).collect(),
    };

    normalized.parse::<Decimal>().ok()
}

/// Truncate to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Format a value as Brazilian currency, e.g. `R$ 1.234,56`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!(
        "{}R$ {},{}",
        if negative { "-" } else { "" },
        grouped,
        frac_part
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_extract_text_and_attr() {
        let html = Html::parse_fragment(
            r#"<div class="card"><h2>  Festival
                de Jazz </h2><a class="more" href="/evento/1">ver</a></div>"#,
        );
        let card = html
            .select(&Selector::parse("div.card").unwrap())
            .next()
            .unwrap();

        assert_eq!(
            extract_text(card, Some("h2")).as_deref(),
            Some("Festival de Jazz")
        );
        assert_eq!(
            extract_attr(card, "href", Some("a.more")).as_deref(),
            Some("/evento/1")
        );
        assert!(extract_text(card, Some("p.missing")).is_none());
        assert!(extract_attr(card, "src", Some("a.more")).is_none());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  a \n\t b   c "), "a b c");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_parse_date_formats() {
        let dt = parse_date("14/03/2025 20:30").unwrap();
        assert_eq!(dt.to_string(), "2025-03-14 20:30:00");

        let dt = parse_date("14/03/2025").unwrap();
        assert_eq!(dt.to_string(), "2025-03-14 00:00:00");

        let dt = parse_date("2025-03-14T08:15:00").unwrap();
        assert_eq!(dt.to_string(), "2025-03-14 08:15:00");

        let dt = parse_date(" 2025-03-14 ").unwrap();
        assert_eq!(dt.to_string(), "2025-03-14 00:00:00");

        assert!(parse_date("next friday").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_parse_date_with_custom_formats() {
        let dt = parse_date_with("March 14, 2025", &["%B %d, %Y"]).unwrap();
        assert_eq!(dt.to_string(), "2025-03-14 00:00:00");
    }

    #[test]
    fn test_extract_price() {
        assert_eq!(extract_price("R$ 1.234,56"), Some(Decimal::new(123456, 2)));
        assert_eq!(extract_price("$1,234.56"), Some(Decimal::new(123456, 2)));
        assert_eq!(extract_price("R$ 50,00"), Some(Decimal::new(5000, 2)));
        assert_eq!(extract_price("12.50"), Some(Decimal::new(1250, 2)));
        assert_eq!(extract_price("1.234.567"), Some(Decimal::new(1234567, 0)));
        assert_eq!(extract_price("R$ 80"), Some(Decimal::new(80, 0)));
        assert_eq!(extract_price("Gratuito"), None);
        assert_eq!(extract_price(""), None);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exposição de arte", 10), "exposiç...");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::new(123456, 2)), "R$ 1.234,56");
        assert_eq!(format_currency(Decimal::new(5, 0)), "R$ 5,00");
        assert_eq!(format_currency(Decimal::new(1234567890, 1)), "R$ 123.456.789,00");
    }
}
