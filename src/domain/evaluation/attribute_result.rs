//! Per-attribute results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::aggregator::Aggregator;
use crate::domain::comparison::ComparisonOutcome;
use crate::domain::foundation::{EngineError, Score};
use crate::domain::schema::EvaluationMethod;

/// Confusion-matrix category of a compared unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCategory {
    /// Both present and matched.
    TruePositive,
    /// Actual present where nothing was expected.
    FalsePositive,
    /// Expected present but actual missing.
    FalseNegative,
    /// Both present but not matched.
    FalseDiscovery,
    /// Both empty.
    TrueNegative,
}

impl MatchCategory {
    /// Classifies a unit by presence and match result.
    pub fn classify(expected_present: bool, actual_present: bool, matched: bool) -> Self {
        match (expected_present, actual_present) {
            (false, false) => MatchCategory::TrueNegative,
            (false, true) => MatchCategory::FalsePositive,
            (true, false) => MatchCategory::FalseNegative,
            (true, true) if matched => MatchCategory::TruePositive,
            (true, true) => MatchCategory::FalseDiscovery,
        }
    }
}

/// Result for one attribute, list item or list.
///
/// Ground-truth fields (`expected`, `matched`, `score`, `method`,
/// `threshold`) are `None` for confidence-only results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeResult {
    /// Dotted path, e.g. `Items[1].Amount`.
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    pub actual: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<EvaluationMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub reason: String,
    /// Set on counted units only (scalar leaves and list items).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MatchCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AttributeResult>,
}

impl AttributeResult {
    /// Result of a ground-truth comparison.
    #[allow(clippy::too_many_arguments)]
    pub fn compared(
        path: impl Into<String>,
        name: impl Into<String>,
        expected: Value,
        actual: Value,
        outcome: ComparisonOutcome,
        method: EvaluationMethod,
        weight: f64,
        category: Option<MatchCategory>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            expected: Some(expected),
            actual,
            matched: Some(outcome.matched),
            score: Some(outcome.score),
            weight,
            method: Some(method),
            threshold: Some(outcome.threshold),
            reason: outcome.reason,
            category,
            confidence: None,
            confidence_threshold: None,
            children: Vec::new(),
        }
    }

    /// Result for a structure compared through its children. The score is
    /// the weighted mean of the leaf scores beneath it.
    pub fn group(
        path: impl Into<String>,
        name: impl Into<String>,
        expected: Value,
        actual: Value,
        weight: f64,
        children: Vec<AttributeResult>,
    ) -> Self {
        let leaves = Aggregator::leaves(&children);
        let matched_leaves = leaves.iter().filter(|r| r.is_matched()).count();
        let reason = format!("{} of {} attributes matched", matched_leaves, leaves.len());
        let score = Score::new(Aggregator::weighted_score(&children));
        let matched = children.iter().all(AttributeResult::is_matched);
        Self {
            path: path.into(),
            name: name.into(),
            expected: Some(expected),
            actual,
            matched: Some(matched),
            score: Some(score),
            weight,
            method: None,
            threshold: None,
            reason,
            category: None,
            confidence: None,
            confidence_threshold: None,
            children,
        }
    }

    /// Result of a confidence assessment.
    pub fn assessed(
        path: impl Into<String>,
        name: impl Into<String>,
        actual: Value,
        confidence: Score,
        confidence_threshold: f64,
        reason: impl Into<String>,
        weight: f64,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            expected: None,
            actual,
            matched: None,
            score: None,
            weight,
            method: None,
            threshold: None,
            reason: reason.into(),
            category: None,
            confidence: Some(confidence),
            confidence_threshold: Some(confidence_threshold),
            children: Vec::new(),
        }
    }

    /// Placeholder attribute explaining why a section could not be evaluated.
    pub fn evaluation_failure(error: &EngineError) -> Self {
        Self {
            path: "evaluation".to_string(),
            name: "evaluation".to_string(),
            expected: None,
            actual: Value::Null,
            matched: Some(false),
            score: Some(Score::ZERO),
            weight: 0.0,
            method: None,
            threshold: None,
            reason: format!("{}. {}", error, error.remediation()),
            category: None,
            confidence: None,
            confidence_threshold: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<AttributeResult>) -> Self {
        self.children = children;
        self
    }

    /// Whether the attribute matched. Confidence-only results never match.
    pub fn is_matched(&self) -> bool {
        self.matched.unwrap_or(false)
    }

    pub fn score_value(&self) -> f64 {
        self.score.map(|s| s.value()).unwrap_or(0.0)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Clears categories on this result and all descendants.
    pub fn clear_categories(&mut self) {
        self.category = None;
        for child in &mut self.children {
            child.clear_categories();
        }
    }

    /// Depth-first iterator over this result and its descendants.
    pub fn walk(&self) -> Vec<&AttributeResult> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}
