//! Extraction of JSON payloads from free-form model output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::foundation::MalformedResponseError;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("Invalid fenced JSON regex")
});

/// Finds the JSON object in a model response.
///
/// Tries, in order: the whole text, a fenced code block, and the span from
/// the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, MalformedResponseError> {
    let trimmed = text.trim();
    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(captures) = FENCED_JSON.captures(trimmed) {
        if let Some(body) = captures.get(1) {
            candidates.push(body.as_str());
        }
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            candidates.push(&trimmed[start..=end]);
        }
    }

    for candidate in candidates {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
            return Ok(map);
        }
    }
    Err(MalformedResponseError::new("response does not contain a JSON object", text))
}
