//! Assessment outcomes.

use serde::{Deserialize, Serialize};

use super::alert::ConfidenceAlert;
use super::prompt::AttributeConfidence;
use crate::domain::evaluation::AttributeResult;
use crate::domain::foundation::{SectionId, TaskId, Timestamp};

/// A cached set of confidences for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedConfidence {
    pub model: String,
    pub entries: Vec<AttributeConfidence>,
    pub cached_at: Timestamp,
}

/// Why a task produced no confidences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub task_id: TaskId,
    pub attributes: Vec<String>,
    pub reason: String,
    /// True when the task never ran because the run was cancelled.
    pub cancelled: bool,
}

/// Result of assessing one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    pub section_id: SectionId,
    pub document_class: String,
    pub results: Vec<AttributeResult>,
    pub alerts: Vec<ConfidenceAlert>,
    pub failures: Vec<TaskFailure>,
    pub cache_hits: usize,
}

impl AssessmentOutcome {
    /// Builds an outcome, deriving alerts from the results.
    pub fn new(
        section_id: SectionId,
        document_class: impl Into<String>,
        results: Vec<AttributeResult>,
        failures: Vec<TaskFailure>,
        cache_hits: usize,
    ) -> Self {
        let alerts = ConfidenceAlert::collect(&results);
        Self {
            section_id,
            document_class: document_class.into(),
            results,
            alerts,
            failures,
            cache_hits,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn cancelled_count(&self) -> usize {
        self.failures.iter().filter(|f| f.cancelled).count()
    }
}
