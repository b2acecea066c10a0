//! Application layer - Services and command handlers.
//!
//! Services implement the engine's async workflows on top of the domain;
//! handlers are the entry points that load inputs and persist artifacts.

pub mod handlers;
pub mod services;

pub use handlers::{
    AssessConfidenceCommand, AssessConfidenceError, AssessConfidenceHandler, AssessConfidenceResult,
    EvaluateDocumentCommand, EvaluateDocumentError, EvaluateDocumentHandler, SectionInput,
};
pub use services::{
    AssessorSettings, ComparatorSettings, ConfidenceAssessor, FieldComparator, ListMatcher,
    SectionEvaluator, WorkerPool, WorkerPoolConfig,
};
