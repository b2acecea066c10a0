//! Confidence prompts, response parsing and cache keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::comparison::extract_json_object;
use crate::domain::decomposition::{flatten_actual, ComparisonTask};
use crate::domain::foundation::{MalformedResponseError, Score};
use crate::domain::schema::SchemaNode;

pub const CONFIDENCE_SYSTEM_PROMPT: &str = "You review values extracted from a document. \
For each attribute, judge how likely the extracted value is correct given the attribute description. \
Respond with a single JSON object keyed by attribute path, where each value is \
{\"confidence\": <number between 0 and 1>, \"reason\": \"<one sentence>\"}.";

/// One value to be rated.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceTarget {
    pub path: String,
    pub name: String,
    pub description: Option<String>,
    pub value: Value,
    pub weight: f64,
    pub confidence_threshold: Option<f64>,
}

impl ConfidenceTarget {
    fn from_node(path: String, node: &SchemaNode, value: Value) -> Self {
        Self {
            path,
            name: node.name.clone(),
            description: node.description.clone(),
            value,
            weight: node.weight(),
            confidence_threshold: node.directives.confidence_threshold,
        }
    }
}

/// Expands a task's attributes into rateable targets, splitting arrays by
/// their actual elements.
pub fn confidence_targets(task: &ComparisonTask) -> Vec<ConfidenceTarget> {
    task.attributes
        .iter()
        .flat_map(|attribute| {
            flatten_actual(&attribute.node, &attribute.actual, &attribute.path)
                .into_iter()
                .map(|leaf| ConfidenceTarget::from_node(leaf.path, leaf.node, leaf.value))
        })
        .collect()
}

/// Builds the user message for a confidence call.
pub fn build_confidence_prompt(document_class: &str, targets: &[ConfidenceTarget]) -> String {
    let mut prompt = format!("Document class: {}\n\nAttributes:\n", document_class);
    for target in targets {
        prompt.push_str(&format!("- path: {}\n", target.path));
        if let Some(description) = &target.description {
            prompt.push_str(&format!("  description: {}\n", description));
        }
        prompt.push_str(&format!("  extracted value: {}\n", target.value));
    }
    prompt
}

/// Confidence for one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeConfidence {
    pub path: String,
    pub confidence: Score,
    pub reason: String,
}

/// Parses a confidence response. Every target must be rated.
pub fn parse_confidence_response(
    text: &str,
    targets: &[ConfidenceTarget],
) -> Result<Vec<AttributeConfidence>, MalformedResponseError> {
    let map = extract_json_object(text)?;
    targets
        .iter()
        .map(|target| {
            let entry = map.get(&target.path).ok_or_else(|| {
                MalformedResponseError::new(format!("no confidence for '{}'", target.path), text)
            })?;
            let (confidence, reason) = match entry {
                Value::Number(n) => (n.as_f64(), String::new()),
                Value::Object(fields) => (
                    fields.get("confidence").and_then(Value::as_f64),
                    fields
                        .get("reason")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                ),
                _ => (None, String::new()),
            };
            let confidence = confidence.ok_or_else(|| {
                MalformedResponseError::new(
                    format!("confidence for '{}' is not a number", target.path),
                    text,
                )
            })?;
            Ok(AttributeConfidence {
                path: target.path.clone(),
                confidence: Score::new(confidence),
                reason,
            })
        })
        .collect()
}

/// Cache key over the model, the document class, and each target's path,
/// description, weight, confidence threshold and actual value. The
/// evaluation method plays no part in confidence prompts and is not hashed.
pub fn confidence_cache_key(document_class: &str, targets: &[ConfidenceTarget], model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(document_class.as_bytes());
    for target in targets {
        hasher.update([0u8]);
        hasher.update(target.path.as_bytes());
        hasher.update([0u8]);
        hasher.update(target.description.as_deref().unwrap_or_default().as_bytes());
        hasher.update([0u8]);
        // Fixed-width fields need no separator between them.
        hasher.update(target.weight.to_be_bytes());
        hasher.update(target.confidence_threshold.unwrap_or(-1.0).to_be_bytes());
        hasher.update(target.value.to_string().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
