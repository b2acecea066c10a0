//! Evaluation methods and their default thresholds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ComparisonConfigError;

/// How a field's expected and actual values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationMethod {
    /// Case-sensitive equality after trimming and stripping terminal punctuation.
    Exact,
    /// Numeric equality within an absolute tolerance.
    NumericExact,
    /// Normalized edit-distance similarity.
    Fuzzy,
    /// Embedding cosine similarity.
    Semantic,
    /// LLM judge.
    Llm,
    /// Optimal bipartite matching of array items.
    Hungarian,
}

impl EvaluationMethod {
    /// All methods, in documentation order.
    pub const ALL: [EvaluationMethod; 6] = [
        EvaluationMethod::Exact,
        EvaluationMethod::NumericExact,
        EvaluationMethod::Fuzzy,
        EvaluationMethod::Semantic,
        EvaluationMethod::Llm,
        EvaluationMethod::Hungarian,
    ];

    /// Canonical configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationMethod::Exact => "EXACT",
            EvaluationMethod::NumericExact => "NUMERIC_EXACT",
            EvaluationMethod::Fuzzy => "FUZZY",
            EvaluationMethod::Semantic => "SEMANTIC",
            EvaluationMethod::Llm => "LLM",
            EvaluationMethod::Hungarian => "HUNGARIAN",
        }
    }

    /// Whether the threshold is an absolute numeric tolerance rather than a
    /// minimum score.
    pub fn threshold_is_tolerance(&self) -> bool {
        matches!(self, EvaluationMethod::NumericExact)
    }

    /// Whether the method needs an external endpoint.
    pub fn requires_endpoint(&self) -> bool {
        matches!(self, EvaluationMethod::Semantic | EvaluationMethod::Llm)
    }
}

impl fmt::Display for EvaluationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationMethod {
    type Err = ComparisonConfigError;

    /// Parses a method name case-insensitively. Unknown names are an error,
    /// never a silent fallback to EXACT.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        EvaluationMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| ComparisonConfigError::unknown_method(s))
    }
}

/// Thresholds applied when a schema node does not set its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodDefaults {
    /// Absolute tolerance for NUMERIC_EXACT.
    pub numeric_tolerance: f64,
    pub fuzzy_threshold: f64,
    pub semantic_threshold: f64,
    pub llm_threshold: f64,
    /// Minimum item similarity for a list pairing to count as matched.
    pub item_threshold: f64,
}

impl Default for MethodDefaults {
    fn default() -> Self {
        Self {
            numeric_tolerance: 0.0001,
            fuzzy_threshold: 0.8,
            semantic_threshold: 0.8,
            llm_threshold: 0.8,
            item_threshold: 0.8,
        }
    }
}

impl MethodDefaults {
    /// Default threshold for a method.
    pub fn threshold_for(&self, method: EvaluationMethod) -> f64 {
        match method {
            EvaluationMethod::Exact => 1.0,
            EvaluationMethod::NumericExact => self.numeric_tolerance,
            EvaluationMethod::Fuzzy => self.fuzzy_threshold,
            EvaluationMethod::Semantic => self.semantic_threshold,
            EvaluationMethod::Llm => self.llm_threshold,
            EvaluationMethod::Hungarian => self.item_threshold,
        }
    }
}
