//! EvaluateDocumentHandler - Command handler for ground-truth evaluation.
//!
//! Loads every section's schema, expected and actual values, evaluates the
//! sections through the worker pool, aggregates them into a `DocumentResult`
//! and writes the report artifacts.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;

use crate::application::services::{SectionEvaluator, TaskOutcome, WorkerPool};
use crate::domain::evaluation::{DocumentResult, SectionResult};
use crate::domain::foundation::{DocumentId, EngineError, ExternalEndpointError, RunId, SectionId};
use crate::domain::report::render_document_report;
use crate::ports::{DocumentStore, ObjectStore, ReportExporter, SectionRef, StoreError};

const DOCUMENT_STORE: &str = "document store";

/// One section to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInput {
    pub section_id: SectionId,
    pub document_class: String,
    pub expected_uri: String,
    pub actual_uri: String,
}

impl SectionInput {
    pub fn new(
        section_id: SectionId,
        document_class: impl Into<String>,
        expected_uri: impl Into<String>,
        actual_uri: impl Into<String>,
    ) -> Self {
        Self {
            section_id,
            document_class: document_class.into(),
            expected_uri: expected_uri.into(),
            actual_uri: actual_uri.into(),
        }
    }

    fn expected_ref(&self) -> SectionRef {
        SectionRef::new(self.section_id.clone(), self.document_class.clone(), self.expected_uri.clone())
    }

    fn actual_ref(&self) -> SectionRef {
        SectionRef::new(self.section_id.clone(), self.document_class.clone(), self.actual_uri.clone())
    }
}

/// Command to evaluate one document.
#[derive(Debug, Clone)]
pub struct EvaluateDocumentCommand {
    pub document_id: DocumentId,
    pub sections: Vec<SectionInput>,
}

/// Errors that abort a document evaluation.
#[derive(Debug, Error)]
pub enum EvaluateDocumentError {
    #[error("Document {0} has no sections to evaluate")]
    NoSections(DocumentId),

    #[error("Failed to write report artifact: {0}")]
    ReportWrite(#[from] StoreError),

    #[error("Failed to serialize evaluation result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Handler for document evaluation.
pub struct EvaluateDocumentHandler {
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    exporter: Option<Arc<dyn ReportExporter>>,
    evaluator: Arc<SectionEvaluator>,
    pool: WorkerPool,
    report_prefix: String,
}

impl EvaluateDocumentHandler {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        evaluator: Arc<SectionEvaluator>,
        pool: WorkerPool,
        report_prefix: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            objects,
            exporter: None,
            evaluator,
            pool,
            report_prefix: report_prefix.into(),
        }
    }

    /// Also render `report.html` through `exporter`.
    pub fn with_exporter(mut self, exporter: Arc<dyn ReportExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub async fn handle(&self, cmd: EvaluateDocumentCommand) -> Result<DocumentResult, EvaluateDocumentError> {
        if cmd.sections.is_empty() {
            return Err(EvaluateDocumentError::NoSections(cmd.document_id));
        }

        let started = Instant::now();
        let run_id = RunId::new();
        tracing::info!(
            document_id = %cmd.document_id,
            run_id = %run_id,
            sections = cmd.sections.len(),
            "Evaluating document"
        );

        let items: Vec<(usize, SectionInput)> = cmd.sections.into_iter().enumerate().collect();
        let outcomes = self
            .pool
            .run(items, None, |_, section| self.evaluate_section(section))
            .await;
        let sections: Vec<SectionResult> = outcomes
            .into_outcomes()
            .filter_map(|(_, outcome)| match outcome {
                TaskOutcome::Completed(section) => Some(section),
                TaskOutcome::Cancelled => None,
            })
            .collect();

        let result = DocumentResult::new(cmd.document_id, run_id, sections, started.elapsed());
        let result = self.write_artifacts(result).await?;

        let metrics = result.metrics();
        tracing::info!(
            document_id = %result.document_id(),
            precision = metrics.precision,
            recall = metrics.recall,
            f1_score = metrics.f1_score,
            failed_sections = metrics.failed_section_count,
            execution_time_ms = result.execution_time_ms(),
            "Document evaluated"
        );
        Ok(result)
    }

    async fn evaluate_section(&self, section: SectionInput) -> SectionResult {
        match self.load_section(&section).await {
            Ok((schema, expected, actual)) => {
                self.evaluator
                    .evaluate(
                        section.section_id,
                        &section.document_class,
                        schema.as_ref(),
                        &expected,
                        &actual,
                    )
                    .await
            }
            Err(error) => {
                tracing::warn!(section_id = %section.section_id, error = %error, "Failed to load section");
                let error = EngineError::from(ExternalEndpointError::new(DOCUMENT_STORE, 1, error.to_string(), false));
                SectionResult::failed(section.section_id, section.document_class, &error)
            }
        }
    }

    async fn load_section(&self, section: &SectionInput) -> Result<(Option<Value>, Value, Value), StoreError> {
        let schema = self.documents.get_schema(&section.document_class).await?;
        let expected = self.documents.get_extracted_values(&section.expected_ref()).await?;
        let actual = self.documents.get_extracted_values(&section.actual_ref()).await?;
        Ok((schema, expected, actual))
    }

    /// Writes `report.md`, optional `report.html` and `evaluation.json`
    /// under `<prefix>/<document_id>/`.
    async fn write_artifacts(&self, result: DocumentResult) -> Result<DocumentResult, EvaluateDocumentError> {
        let base = format!("{}/{}", self.report_prefix.trim_end_matches('/'), result.document_id());

        let markdown = render_document_report(&result);
        let report_uri = self
            .objects
            .put(&format!("{}/report.md", base), markdown.clone().into_bytes(), "text/markdown")
            .await?;

        if let Some(exporter) = &self.exporter {
            let title = format!("Evaluation Report: {}", result.document_id());
            match exporter.to_html(&markdown, &title).await {
                Ok(html) => {
                    self.objects
                        .put(&format!("{}/report.html", base), html.into_bytes(), "text/html")
                        .await?;
                }
                Err(error) => {
                    tracing::warn!(document_id = %result.document_id(), error = %error, "HTML export failed");
                }
            }
        }

        let result = result.with_report_uri(report_uri);
        let json = serde_json::to_vec_pretty(&result)?;
        self.objects
            .put(&format!("{}/evaluation.json", base), json, "application/json")
            .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::report::HtmlReportExporter;
    use crate::adapters::storage::{InMemoryDocumentStore, InMemoryObjectStore};
    use crate::application::services::{ComparatorSettings, FieldComparator, ListMatcher};
    use crate::domain::decomposition::TaskDecomposer;
    use crate::domain::schema::SchemaResolver;
    use serde_json::json;

    fn evaluator() -> Arc<SectionEvaluator> {
        let comparator = Arc::new(FieldComparator::new(ComparatorSettings::default()));
        Arc::new(SectionEvaluator::new(
            Arc::new(SchemaResolver::new()),
            TaskDecomposer::default(),
            Arc::new(ListMatcher::new(comparator, WorkerPool::with_workers(2))),
            WorkerPool::with_workers(2),
        ))
    }

    async fn documents() -> Arc<InMemoryDocumentStore> {
        let store = InMemoryDocumentStore::new();
        store
            .insert_schema(
                "receipt",
                json!({"type": "object", "properties": {"Merchant": {"type": "string"}, "Total": {"type": "number"}}}),
            )
            .await;
        store.insert_values("mem://p1/expected", json!({"Merchant": "Shop", "Total": 10})).await;
        store.insert_values("mem://p1/actual", json!({"Merchant": "Shop", "Total": "10.00"})).await;
        store.insert_values("mem://p2/expected", json!({"Employer": "Acme"})).await;
        store.insert_values("mem://p2/actual", json!({"Employer": "Acme"})).await;
        Arc::new(store)
    }

    fn section(id: &str, class: &str) -> SectionInput {
        SectionInput::new(
            SectionId::new(id).unwrap(),
            class,
            format!("mem://{}/expected", id),
            format!("mem://{}/actual", id),
        )
    }

    #[tokio::test]
    async fn writes_artifacts_and_returns_report_uri() {
        let objects = Arc::new(InMemoryObjectStore::new());
        let handler = EvaluateDocumentHandler::new(documents().await, objects.clone(), evaluator(), WorkerPool::with_workers(2), "reports")
            .with_exporter(Arc::new(HtmlReportExporter::new()));

        let result = handler
            .handle(EvaluateDocumentCommand {
                document_id: DocumentId::new("doc-1").unwrap(),
                sections: vec![section("p1", "receipt")],
            })
            .await
            .unwrap();

        assert_eq!(result.report_uri(), Some("reports/doc-1/report.md"));
        assert_eq!(result.metrics().precision, 1.0);
        assert!(objects.get_text("reports/doc-1/report.md").await.unwrap().contains("doc-1"));
        assert!(objects.get_text("reports/doc-1/report.html").await.unwrap().contains("<table>"));
        let stored: Value = serde_json::from_str(&objects.get_text("reports/doc-1/evaluation.json").await.unwrap()).unwrap();
        assert_eq!(stored["report_uri"], "reports/doc-1/report.md");
    }

    #[tokio::test]
    async fn failed_section_does_not_fail_the_document() {
        let objects = Arc::new(InMemoryObjectStore::new());
        let handler = EvaluateDocumentHandler::new(documents().await, objects, evaluator(), WorkerPool::with_workers(2), "reports");

        let result = handler
            .handle(EvaluateDocumentCommand {
                document_id: DocumentId::new("doc-2").unwrap(),
                sections: vec![section("p1", "receipt"), section("p2", "W2")],
            })
            .await
            .unwrap();

        let sections = result.sections();
        assert_eq!(sections.len(), 2);
        assert!(!sections[0].is_failed());
        assert!(sections[1].is_failed());
        assert_eq!(result.metrics().failed_section_count, 1);
        assert_eq!(result.metrics().precision, 0.5);
    }

    #[tokio::test]
    async fn unreadable_values_fail_only_their_section() {
        let objects = Arc::new(InMemoryObjectStore::new());
        let handler = EvaluateDocumentHandler::new(documents().await, objects, evaluator(), WorkerPool::with_workers(1), "reports");

        let result = handler
            .handle(EvaluateDocumentCommand {
                document_id: DocumentId::new("doc-3").unwrap(),
                sections: vec![section("p9", "receipt")],
            })
            .await
            .unwrap();

        assert!(result.sections()[0].failure_reason().unwrap().contains(DOCUMENT_STORE));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let handler = EvaluateDocumentHandler::new(
            documents().await,
            Arc::new(InMemoryObjectStore::new()),
            evaluator(),
            WorkerPool::default(),
            "reports",
        );
        let err = handler
            .handle(EvaluateDocumentCommand {
                document_id: DocumentId::new("doc-4").unwrap(),
                sections: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EvaluateDocumentError::NoSections(_)));
    }
}
