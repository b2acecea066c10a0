//! Application services - the async engine around the pure domain.
//!
//! - `WorkerPool` - bounded task queue with cooperative cancellation
//! - `FieldComparator` - per-method comparison of one field
//! - `ListMatcher` - nested comparison and optimal list matching
//! - `SectionEvaluator` - one section against its ground truth
//! - `ConfidenceAssessor` - per-field confidence without ground truth

mod confidence_assessor;
mod field_comparator;
mod list_matcher;
mod section_evaluator;
mod worker_pool;

pub use confidence_assessor::{AssessorSettings, ConfidenceAssessor};
pub use field_comparator::{ComparatorSettings, FieldComparator};
pub use list_matcher::ListMatcher;
pub use section_evaluator::SectionEvaluator;
pub use worker_pool::{PoolResults, TaskOutcome, WorkerPool, WorkerPoolConfig};
