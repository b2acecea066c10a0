//! Assessment module - confidence scoring without ground truth.

mod alert;
mod outcome;
mod prompt;

pub use alert::ConfidenceAlert;
pub use outcome::{AssessmentOutcome, CachedConfidence, TaskFailure};
pub use prompt::{
    build_confidence_prompt, confidence_cache_key, confidence_targets, parse_confidence_response,
    AttributeConfidence, ConfidenceTarget, CONFIDENCE_SYSTEM_PROMPT,
};
