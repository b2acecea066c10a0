//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and the error taxonomy that form the
//! vocabulary of the evaluation engine.

mod errors;
mod ids;
mod score;
mod timestamp;

pub use errors::{
    ComparisonConfigError, EngineError, ExternalEndpointError, MalformedResponseError,
    SchemaResolutionError, ValidationError,
};
pub use ids::{DocumentId, RunId, SectionId, TaskId};
pub use score::Score;
pub use timestamp::Timestamp;
