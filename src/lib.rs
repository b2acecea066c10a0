//! Extraction Evaluator - Schema-aware evaluation of extracted document data
//!
//! Compares structured values extracted from a document against a ground-truth
//! version of the same structure, and estimates per-field confidence when no
//! ground truth exists.
//!
//! - `domain` - schema resolution, task decomposition, comparison kernels,
//!   optimal list assignment, metrics and report rendering (pure)
//! - `ports` - traits for inference endpoints, stores and caches
//! - `adapters` - HTTP providers, mocks, file-backed and in-memory stores
//! - `application` - worker pool, comparator, matcher, assessor and handlers
//! - `config` - environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
