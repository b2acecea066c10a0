//! Evaluation handlers - ground-truth evaluation and confidence assessment.

mod assess_confidence;
mod evaluate_document;

pub use assess_confidence::{
    AssessConfidenceCommand, AssessConfidenceError, AssessConfidenceHandler, AssessConfidenceResult,
};
pub use evaluate_document::{
    EvaluateDocumentCommand, EvaluateDocumentError, EvaluateDocumentHandler, SectionInput,
};
