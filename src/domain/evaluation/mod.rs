//! Evaluation module - attribute results, metrics and aggregation.

mod aggregator;
mod attribute_result;
mod metrics;
mod results;

pub use aggregator::Aggregator;
pub use attribute_result::{AttributeResult, MatchCategory};
pub use metrics::{DocumentMetrics, MatchCounts, SectionMetrics};
pub use results::{DocumentResult, SectionResult};
