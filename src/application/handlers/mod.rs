//! Application handlers.
//!
//! Command handlers that load inputs through the ports and drive the
//! services.

pub mod evaluation;

pub use evaluation::{
    AssessConfidenceCommand, AssessConfidenceError, AssessConfidenceHandler, AssessConfidenceResult,
    EvaluateDocumentCommand, EvaluateDocumentError, EvaluateDocumentHandler, SectionInput,
};
