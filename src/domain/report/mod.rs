//! Report module - human-readable renderings of results.

mod markdown;

pub use markdown::{render_assessment_report, render_document_report};
