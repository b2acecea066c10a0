//! Domain layer containing evaluation logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, scores, timestamps, errors)
//! - `schema` - Schema resolution and evaluation directives
//! - `decomposition` - Splitting schemas and instances into comparison tasks
//! - `comparison` - Pure comparison kernels and LLM judge parsing
//! - `matching` - Optimal assignment for list items
//! - `evaluation` - Attribute results, metrics and aggregation
//! - `assessment` - Confidence prompts, alerts and outcomes
//! - `report` - Markdown report rendering

pub mod assessment;
pub mod comparison;
pub mod decomposition;
pub mod evaluation;
pub mod foundation;
pub mod matching;
pub mod report;
pub mod schema;
