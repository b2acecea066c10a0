//! Section and document results.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::aggregator::Aggregator;
use super::attribute_result::AttributeResult;
use super::metrics::{DocumentMetrics, SectionMetrics};
use crate::domain::foundation::{DocumentId, EngineError, RunId, SectionId, Timestamp};

/// Evaluation result for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionResult {
    pub section_id: SectionId,
    pub document_class: String,
    pub attributes: Vec<AttributeResult>,
    pub metrics: SectionMetrics,
}

impl SectionResult {
    /// Builds a section result, computing metrics from `attributes`.
    pub fn evaluated(
        section_id: SectionId,
        document_class: impl Into<String>,
        attributes: Vec<AttributeResult>,
    ) -> Self {
        let metrics = Aggregator::section_metrics(&attributes);
        Self {
            section_id,
            document_class: document_class.into(),
            attributes,
            metrics,
        }
    }

    /// A section that could not be evaluated. Metrics are all zero.
    pub fn failed(section_id: SectionId, document_class: impl Into<String>, error: &EngineError) -> Self {
        Self {
            section_id,
            document_class: document_class.into(),
            attributes: vec![AttributeResult::evaluation_failure(error)],
            metrics: SectionMetrics::failed(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.metrics.evaluation_failed
    }

    /// Failure reason for failed sections.
    pub fn failure_reason(&self) -> Option<&str> {
        if self.is_failed() {
            self.attributes.first().map(|a| a.reason.as_str())
        } else {
            None
        }
    }
}

/// Evaluation result for one document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    document_id: DocumentId,
    run_id: RunId,
    sections: Vec<SectionResult>,
    metrics: DocumentMetrics,
    execution_time_ms: u64,
    evaluated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    report_uri: Option<String>,
}

impl DocumentResult {
    pub fn new(
        document_id: DocumentId,
        run_id: RunId,
        sections: Vec<SectionResult>,
        execution_time: Duration,
    ) -> Self {
        let metrics = Aggregator::document_metrics(&sections);
        Self {
            document_id,
            run_id,
            sections,
            metrics,
            execution_time_ms: u64::try_from(execution_time.as_millis()).unwrap_or(u64::MAX),
            evaluated_at: Timestamp::now(),
            report_uri: None,
        }
    }

    /// Attaches the location of the rendered report.
    pub fn with_report_uri(mut self, uri: impl Into<String>) -> Self {
        self.report_uri = Some(uri.into());
        self
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn sections(&self) -> &[SectionResult] {
        &self.sections
    }

    pub fn metrics(&self) -> &DocumentMetrics {
        &self.metrics
    }

    pub fn execution_time_ms(&self) -> u64 {
        self.execution_time_ms
    }

    pub fn evaluated_at(&self) -> &Timestamp {
        &self.evaluated_at
    }

    pub fn report_uri(&self) -> Option<&str> {
        self.report_uri.as_deref()
    }

    pub fn evaluation_failed(&self) -> bool {
        self.metrics.evaluation_failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SchemaResolutionError;

    #[test]
    fn failed_section_reports_reason() {
        let section = SectionResult::failed(
            SectionId::new("p1").unwrap(),
            "W2",
            &EngineError::from(SchemaResolutionError::MissingSchema {
                document_class: "W2".into(),
            }),
        );
        assert!(section.is_failed());
        assert!(section.failure_reason().unwrap().contains("No schema configured"));
        assert_eq!(section.metrics.f1_score, 0.0);
    }

    #[test]
    fn document_result_is_built_once() {
        let result = DocumentResult::new(
            DocumentId::new("doc-1").unwrap(),
            RunId::new(),
            vec![],
            Duration::from_millis(42),
        )
        .with_report_uri("reports/doc-1/report.md");
        assert_eq!(result.execution_time_ms(), 42);
        assert_eq!(result.report_uri(), Some("reports/doc-1/report.md"));
        assert_eq!(result.metrics().section_count, 0);
    }

    #[test]
    fn serializes_round_trip() {
        let result = DocumentResult::new(
            DocumentId::new("doc-1").unwrap(),
            RunId::new(),
            vec![],
            Duration::from_millis(1),
        );
        let json = serde_json::to_string(&result).unwrap();
        let back: DocumentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
