//! Comparison outcomes and the pure comparison kernels.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize::{is_empty_value, normalize_exact, normalize_fuzzy, parse_number, value_to_text};
use crate::domain::foundation::Score;

/// Result of comparing one expected value with one actual value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    pub matched: bool,
    pub score: Score,
    /// Threshold the decision was made against (a tolerance for numeric
    /// comparison).
    pub threshold: f64,
    pub reason: String,
}

impl ComparisonOutcome {
    /// Outcome where `matched` is derived from `score >= threshold`.
    pub fn scored(score: f64, threshold: f64, reason: impl Into<String>) -> Self {
        let score = Score::new(score);
        Self {
            matched: score.meets(threshold),
            score,
            threshold,
            reason: reason.into(),
        }
    }

    /// Both sides empty: a match with a perfect score.
    pub fn both_empty(threshold: f64) -> Self {
        Self {
            matched: true,
            score: Score::ONE,
            threshold,
            reason: "Both values are empty".to_string(),
        }
    }

    /// A zero-score non-match, used for missing values and endpoint failures.
    pub fn unmatched(threshold: f64, reason: impl Into<String>) -> Self {
        Self {
            matched: false,
            score: Score::ZERO,
            threshold,
            reason: reason.into(),
        }
    }
}

/// Handles the empty cases shared by every method.
///
/// Returns `None` when both sides hold a value and the method must decide.
pub fn compare_presence(expected: &Value, actual: &Value, threshold: f64) -> Option<ComparisonOutcome> {
    match (is_empty_value(expected), is_empty_value(actual)) {
        (true, true) => Some(ComparisonOutcome::both_empty(threshold)),
        (false, true) => Some(ComparisonOutcome::unmatched(
            threshold,
            "Expected a value but the actual value is missing",
        )),
        (true, false) => Some(ComparisonOutcome::unmatched(
            threshold,
            "Actual value present but no value was expected",
        )),
        (false, false) => None,
    }
}

/// EXACT: equality after trimming and stripping trailing punctuation.
pub fn compare_exact(expected: &Value, actual: &Value) -> ComparisonOutcome {
    let e = normalize_exact(&value_to_text(expected));
    let a = normalize_exact(&value_to_text(actual));
    if e == a {
        ComparisonOutcome::scored(1.0, 1.0, "Values are identical")
    } else {
        ComparisonOutcome::scored(0.0, 1.0, format!("'{}' differs from '{}'", a, e))
    }
}

/// NUMERIC_EXACT: equal within an absolute tolerance.
///
/// A non-match still carries a relative-error score so near misses rank
/// above wild ones, but never reaches 1.0.
pub fn compare_numeric(expected: &Value, actual: &Value, tolerance: f64) -> ComparisonOutcome {
    let (Some(e), Some(a)) = (parse_number(expected), parse_number(actual)) else {
        return compare_exact(expected, actual).with_threshold(tolerance, "Values are not numeric");
    };
    let diff = (e - a).abs();
    if diff <= tolerance {
        return ComparisonOutcome {
            matched: true,
            score: Score::ONE,
            threshold: tolerance,
            reason: format!("{} equals {} within tolerance {}", a, e, tolerance),
        };
    }
    let denominator = if e != 0.0 { e.abs() } else { 1.0 };
    let score = (1.0 - diff / denominator).clamp(0.0, 0.999_999);
    ComparisonOutcome {
        matched: false,
        score: Score::new(score),
        threshold: tolerance,
        reason: format!("{} differs from {} by {}", a, e, diff),
    }
}

/// FUZZY: normalized Levenshtein similarity on case-folded text.
pub fn compare_fuzzy(expected: &Value, actual: &Value, threshold: f64) -> ComparisonOutcome {
    let e = normalize_fuzzy(&value_to_text(expected));
    let a = normalize_fuzzy(&value_to_text(actual));
    let similarity = strsim::normalized_levenshtein(&e, &a);
    ComparisonOutcome::scored(
        similarity,
        threshold,
        format!("Edit similarity {:.3} against threshold {:.3}", similarity, threshold),
    )
}

/// Cosine similarity clamped to `[0, 1]`. Zero or mismatched vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

/// SEMANTIC: decision on a precomputed similarity.
pub fn semantic_outcome(similarity: f64, threshold: f64) -> ComparisonOutcome {
    ComparisonOutcome::scored(
        similarity,
        threshold,
        format!("Semantic similarity {:.3} against threshold {:.3}", similarity, threshold),
    )
}

impl ComparisonOutcome {
    fn with_threshold(mut self, threshold: f64, note: &str) -> Self {
        self.threshold = threshold;
        self.reason = format!("{}; {}", note, self.reason);
        self
    }
}
