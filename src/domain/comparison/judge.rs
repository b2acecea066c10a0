//! LLM judge prompts and verdict parsing.

use serde_json::Value;

use super::normalize::value_to_text;
use super::response::extract_json_object;
use crate::domain::foundation::{MalformedResponseError, Score};

pub const JUDGE_SYSTEM_PROMPT: &str = "You compare an extracted field value with its ground-truth value. \
Decide whether they convey the same information for the field described. \
Respond with a single JSON object: {\"match\": true|false, \"score\": <number between 0 and 1>, \"reason\": \"<one sentence>\"}.";

/// Builds the user message for a judge call.
pub fn build_judge_prompt(
    field_path: &str,
    description: Option<&str>,
    expected: &Value,
    actual: &Value,
) -> String {
    let mut prompt = format!("Field: {}\n", field_path);
    if let Some(description) = description {
        prompt.push_str(&format!("Field description: {}\n", description));
    }
    prompt.push_str(&format!("Expected value: {}\n", render_value(expected)));
    prompt.push_str(&format!("Actual value: {}\n", render_value(actual)));
    prompt
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => value_to_text(other),
    }
}

/// Parsed judge verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    /// The judge's own opinion. The final decision is `score >= threshold`.
    pub judged_match: bool,
    pub score: Score,
    pub reason: String,
}

/// Parses a judge response. A missing score is derived from `match`.
pub fn parse_judge_response(text: &str) -> Result<JudgeVerdict, MalformedResponseError> {
    let map = extract_json_object(text)?;
    let judged_match = map
        .get("match")
        .or_else(|| map.get("matched"))
        .and_then(Value::as_bool);
    let score = match map.get("score") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_f64().ok_or_else(|| {
            MalformedResponseError::new("score is not a number", text)
        })?),
    };

    let (judged_match, score) = match (judged_match, score) {
        (None, None) => {
            return Err(MalformedResponseError::new(
                "response has neither 'match' nor 'score'",
                text,
            ))
        }
        (Some(m), None) => (m, if m { 1.0 } else { 0.0 }),
        (m, Some(s)) => (m.unwrap_or(s >= 0.5), s),
    };
    let reason = map
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(JudgeVerdict {
        judged_match,
        score: Score::new(score),
        reason,
    })
}
