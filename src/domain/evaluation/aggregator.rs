//! Metric aggregation.

use super::attribute_result::{AttributeResult, MatchCategory};
use super::metrics::{DocumentMetrics, MatchCounts, SectionMetrics};
use super::results::SectionResult;

/// Computes section and document metrics from attribute results.
pub struct Aggregator;

impl Aggregator {
    /// Counts categorized units anywhere in the result trees.
    pub fn count(results: &[AttributeResult]) -> MatchCounts {
        let mut counts = MatchCounts::default();
        for unit in results.iter().flat_map(AttributeResult::walk) {
            match unit.category {
                Some(MatchCategory::TruePositive) => counts.true_positives += 1,
                Some(MatchCategory::FalsePositive) => counts.false_positives += 1,
                Some(MatchCategory::FalseNegative) => counts.false_negatives += 1,
                Some(MatchCategory::FalseDiscovery) => counts.false_discoveries += 1,
                Some(MatchCategory::TrueNegative) => counts.true_negatives += 1,
                None => {}
            }
        }
        counts
    }

    /// Scored leaves, in depth-first order.
    pub fn leaves(results: &[AttributeResult]) -> Vec<&AttributeResult> {
        results
            .iter()
            .flat_map(AttributeResult::walk)
            .filter(|r| r.is_leaf() && r.score.is_some())
            .collect()
    }

    /// Weighted mean of leaf scores. Zero when no weight is present.
    pub fn weighted_score(results: &[AttributeResult]) -> f64 {
        let (weighted, total) = Self::leaves(results)
            .iter()
            .filter(|r| r.weight > 0.0)
            .fold((0.0, 0.0), |(sum, weights), r| {
                (sum + r.weight * r.score_value(), weights + r.weight)
            });
        ratio(weighted, total).clamp(0.0, 1.0)
    }

    /// Metrics for one section.
    pub fn section_metrics(results: &[AttributeResult]) -> SectionMetrics {
        let counts = Self::count(results);
        let tp = f64::from(counts.true_positives);
        let fp = f64::from(counts.precision_false_positives());
        let fn_ = f64::from(counts.recall_false_negatives());

        let (precision, recall) = if counts.total() == 0 {
            (0.0, 0.0)
        } else if tp + fp + fn_ == 0.0 {
            // Only true negatives: nothing expected, nothing extracted.
            (1.0, 1.0)
        } else {
            (ratio(tp, tp + fp), ratio(tp, tp + fn_))
        };
        let accuracy = ratio(
            f64::from(counts.true_positives + counts.true_negatives),
            f64::from(counts.total()),
        );

        SectionMetrics {
            precision,
            recall,
            f1_score: f1(precision, recall),
            accuracy,
            weighted_score: Self::weighted_score(results),
            counts,
            attribute_count: Self::leaves(results).len(),
            evaluation_failed: false,
        }
    }

    /// Arithmetic mean over sections. Failed sections count as zeros.
    pub fn document_metrics(sections: &[SectionResult]) -> DocumentMetrics {
        let section_count = sections.len();
        if section_count == 0 {
            return DocumentMetrics::default();
        }
        let n = section_count as f64;
        let mean = |f: fn(&SectionMetrics) -> f64| sections.iter().map(|s| f(&s.metrics)).sum::<f64>() / n;

        let mut counts = MatchCounts::default();
        for section in sections {
            counts.add(&section.metrics.counts);
        }

        DocumentMetrics {
            precision: mean(|m| m.precision),
            recall: mean(|m| m.recall),
            f1_score: mean(|m| m.f1_score),
            accuracy: mean(|m| m.accuracy),
            weighted_score: mean(|m| m.weighted_score),
            counts,
            section_count,
            failed_section_count: sections.iter().filter(|s| s.metrics.evaluation_failed).count(),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}
