//! AssessConfidenceHandler - Command handler for confidence assessment.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::application::services::ConfidenceAssessor;
use crate::domain::assessment::AssessmentOutcome;
use crate::domain::foundation::EngineError;
use crate::domain::report::render_assessment_report;
use crate::ports::{DocumentStore, SectionRef, StoreError};

/// Command to assess one section's extracted values.
#[derive(Debug, Clone)]
pub struct AssessConfidenceCommand {
    pub section: SectionRef,
    /// Once `true`, no further tasks are dispatched.
    pub shutdown: Option<watch::Receiver<bool>>,
}

impl AssessConfidenceCommand {
    pub fn new(section: SectionRef) -> Self {
        Self { section, shutdown: None }
    }

    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }
}

/// Result of an assessment.
#[derive(Debug, Clone)]
pub struct AssessConfidenceResult {
    pub outcome: AssessmentOutcome,
    pub report_markdown: String,
}

#[derive(Debug, Error)]
pub enum AssessConfidenceError {
    #[error("Failed to load section: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Handler for confidence assessment.
pub struct AssessConfidenceHandler {
    documents: Arc<dyn DocumentStore>,
    assessor: Arc<ConfidenceAssessor>,
}

impl AssessConfidenceHandler {
    pub fn new(documents: Arc<dyn DocumentStore>, assessor: Arc<ConfidenceAssessor>) -> Self {
        Self { documents, assessor }
    }

    pub async fn handle(&self, cmd: AssessConfidenceCommand) -> Result<AssessConfidenceResult, AssessConfidenceError> {
        let section = cmd.section;
        let schema = self.documents.get_schema(&section.document_class).await?;
        let actual = self.documents.get_extracted_values(&section).await?;

        let outcome = self
            .assessor
            .assess(
                section.section_id,
                &section.document_class,
                schema.as_ref(),
                &actual,
                cmd.shutdown,
            )
            .await?;

        if !outcome.is_complete() {
            tracing::warn!(
                section_id = %outcome.section_id,
                failures = outcome.failures.len(),
                cancelled = outcome.cancelled_count(),
                "Assessment incomplete; rerun to retry failed tasks"
            );
        }

        let report_markdown = render_assessment_report(&outcome);
        Ok(AssessConfidenceResult {
            outcome,
            report_markdown,
        })
    }
}
