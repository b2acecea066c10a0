//! Section and document metrics.

use serde::{Deserialize, Serialize};

/// Confusion-matrix counts over the counted units of a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    pub true_positives: u32,
    pub false_positives: u32,
    pub false_negatives: u32,
    pub false_discoveries: u32,
    pub true_negatives: u32,
}

impl MatchCounts {
    pub fn total(&self) -> u32 {
        self.true_positives
            + self.false_positives
            + self.false_negatives
            + self.false_discoveries
            + self.true_negatives
    }

    /// False positives for precision: spurious values plus wrong values.
    pub fn precision_false_positives(&self) -> u32 {
        self.false_positives + self.false_discoveries
    }

    /// False negatives for recall: missing values plus wrong values.
    pub fn recall_false_negatives(&self) -> u32 {
        self.false_negatives + self.false_discoveries
    }

    pub fn add(&mut self, other: &MatchCounts) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.false_discoveries += other.false_discoveries;
        self.true_negatives += other.true_negatives;
    }
}

/// Metrics for one section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub accuracy: f64,
    pub weighted_score: f64,
    pub counts: MatchCounts,
    /// Number of scored leaves.
    pub attribute_count: usize,
    pub evaluation_failed: bool,
}

impl SectionMetrics {
    /// All-zero metrics for a section that could not be evaluated.
    pub fn failed() -> Self {
        Self {
            evaluation_failed: true,
            ..Self::default()
        }
    }
}

/// Metrics for a whole document: arithmetic means over its sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub accuracy: f64,
    pub weighted_score: f64,
    pub counts: MatchCounts,
    pub section_count: usize,
    pub failed_section_count: usize,
}

impl DocumentMetrics {
    /// True when every section failed.
    pub fn evaluation_failed(&self) -> bool {
        self.section_count > 0 && self.failed_section_count == self.section_count
    }
}
