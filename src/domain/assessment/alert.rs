//! Low-confidence alerts.

use serde::{Deserialize, Serialize};

use crate::domain::evaluation::AttributeResult;

/// Raised when an attribute's confidence falls below its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceAlert {
    pub attribute_name: String,
    pub confidence: f64,
    pub confidence_threshold: f64,
}

impl ConfidenceAlert {
    /// One alert per result whose confidence is strictly below its threshold.
    pub fn collect(results: &[AttributeResult]) -> Vec<ConfidenceAlert> {
        results
            .iter()
            .filter_map(|result| {
                let confidence = result.confidence?.value();
                let threshold = result.confidence_threshold?;
                (confidence < threshold).then(|| ConfidenceAlert {
                    attribute_name: result.path.clone(),
                    confidence,
                    confidence_threshold: threshold,
                })
            })
            .collect()
    }
}
