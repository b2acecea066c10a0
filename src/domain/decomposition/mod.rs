//! Decomposition module - splitting a schema and its instances into tasks.

mod decomposer;
mod task;

pub use decomposer::{DecomposerConfig, TaskDecomposer};
pub use task::{flatten_actual, ComparisonTask, TaskAttribute, TaskKind, ValueLeaf};
