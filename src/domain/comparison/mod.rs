//! Comparison module - pure comparison kernels and LLM judge parsing.
//!
//! Methods that need an external endpoint (SEMANTIC, LLM) are orchestrated
//! by the application layer; this module only holds the deterministic parts.

mod judge;
mod normalize;
mod outcome;
mod response;

pub use judge::{build_judge_prompt, parse_judge_response, JudgeVerdict, JUDGE_SYSTEM_PROMPT};
pub use normalize::{is_empty_value, normalize_exact, normalize_fuzzy, parse_number, value_to_text};
pub use outcome::{
    compare_exact, compare_fuzzy, compare_numeric, compare_presence, cosine_similarity,
    semantic_outcome, ComparisonOutcome,
};
pub use response::extract_json_object;
