//! Value normalization helpers shared by the comparison kernels.

use serde_json::Value;

const TERMINAL_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩', '₽', '¢'];

/// Empty means `null`, a blank string, an empty array or an empty object.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Text form of a value. Strings are returned without quotes.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Trims whitespace and strips trailing punctuation. Case is preserved.
pub fn normalize_exact(text: &str) -> String {
    text.trim()
        .trim_end_matches(TERMINAL_PUNCTUATION)
        .trim_end()
        .to_string()
}

/// Lowercases and collapses runs of whitespace.
pub fn normalize_fuzzy(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parses a number from a JSON number or a formatted string.
///
/// Accepts currency symbols and codes, thousands separators, a trailing `%`
/// and accounting-style parentheses for negatives.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number_text(s),
        _ => None,
    }
}

fn parse_number_text(text: &str) -> Option<f64> {
    let mut s = text.trim();
    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        negative = true;
        s = s[1..s.len() - 1].trim();
    }
    let s = s
        .trim_end_matches('%')
        .trim_matches(|c: char| c.is_alphabetic() || CURRENCY_SYMBOLS.contains(&c) || c.is_whitespace());
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}' | '\''))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let parsed: f64 = cleaned.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some(if negative { -parsed } else { parsed })
}
