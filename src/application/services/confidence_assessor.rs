//! ConfidenceAssessor - Per-field confidence without ground truth.
//!
//! Each decomposed task becomes one LLM call asking for a confidence and a
//! rationale per leaf attribute. Tasks run through the worker pool; results
//! already in the cache are reused so a rerun after throttling only pays for
//! the tasks that failed. Endpoint failures are recorded per task, never
//! raised for the section.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use super::worker_pool::{TaskOutcome, WorkerPool};
use crate::domain::assessment::{
    build_confidence_prompt, confidence_cache_key, confidence_targets, parse_confidence_response,
    AssessmentOutcome, AttributeConfidence, CachedConfidence, ConfidenceTarget, TaskFailure,
    CONFIDENCE_SYSTEM_PROMPT,
};
use crate::domain::decomposition::{ComparisonTask, TaskDecomposer};
use crate::domain::evaluation::AttributeResult;
use crate::domain::foundation::{EngineError, SchemaResolutionError, Score, SectionId, TaskId, Timestamp};
use crate::domain::schema::SchemaResolver;
use crate::ports::{CallPurpose, CompletionRequest, LlmProvider, MessageRole, RequestMetadata, ResultCache};

const CONFIDENCE_ENDPOINT: &str = "confidence endpoint";

/// Assessor tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessorSettings {
    /// Used when a schema node carries no `x-confidence-threshold`.
    pub default_confidence_threshold: f64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AssessorSettings {
    fn default() -> Self {
        Self {
            default_confidence_threshold: 0.8,
            temperature: 0.0,
            max_tokens: 2048,
        }
    }
}

/// What one task produced.
struct TaskAssessment {
    results: Vec<AttributeResult>,
    failure: Option<TaskFailure>,
    cache_hit: bool,
}

impl TaskAssessment {
    fn failed(failure: TaskFailure) -> Self {
        Self {
            results: Vec::new(),
            failure: Some(failure),
            cache_hit: false,
        }
    }
}

/// Confidence assessor.
pub struct ConfidenceAssessor {
    resolver: Arc<SchemaResolver>,
    decomposer: TaskDecomposer,
    llm: Arc<dyn LlmProvider>,
    cache: Option<Arc<dyn ResultCache>>,
    pool: WorkerPool,
    settings: AssessorSettings,
    trace_id: String,
}

impl ConfidenceAssessor {
    pub fn new(
        resolver: Arc<SchemaResolver>,
        decomposer: TaskDecomposer,
        llm: Arc<dyn LlmProvider>,
        pool: WorkerPool,
        settings: AssessorSettings,
    ) -> Self {
        Self {
            resolver,
            decomposer,
            llm,
            cache: None,
            pool,
            settings,
            trace_id: String::new(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Assesses the extracted values of one section.
    ///
    /// Only schema problems are returned as errors. Endpoint failures and
    /// cancelled tasks are listed in the outcome's `failures`.
    pub async fn assess(
        &self,
        section_id: SectionId,
        document_class: &str,
        schema: Option<&Value>,
        actual: &Value,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<AssessmentOutcome, EngineError> {
        let schema = schema.ok_or_else(|| SchemaResolutionError::MissingSchema {
            document_class: document_class.to_string(),
        })?;
        let resolved = self.resolver.resolve(document_class, schema)?;
        let tasks = self.decomposer.decompose(&resolved, actual, None);
        let model = self.llm.provider_info().model;

        let items: Vec<(TaskId, (Vec<String>, Vec<ConfidenceTarget>))> = tasks
            .iter()
            .map(|task| (task.id.clone(), (task_paths(task), confidence_targets(task))))
            .collect();
        let task_count = items.len();
        let attributes_by_task: Vec<(TaskId, Vec<String>)> = items
            .iter()
            .map(|(id, (paths, _))| (id.clone(), paths.clone()))
            .collect();

        let outcomes = self
            .pool
            .run(items, shutdown, |task_id, (_, targets)| {
                self.assess_task(task_id, document_class, targets, &model)
            })
            .await;

        let mut results = Vec::new();
        let mut failures = Vec::new();
        let mut cache_hits = 0;
        for (task_id, paths) in attributes_by_task {
            match outcomes.get(&task_id) {
                Some(TaskOutcome::Completed(assessment)) => {
                    results.extend(assessment.results.iter().cloned());
                    failures.extend(assessment.failure.clone());
                    cache_hits += usize::from(assessment.cache_hit);
                }
                Some(TaskOutcome::Cancelled) | None => failures.push(TaskFailure {
                    task_id,
                    attributes: paths,
                    reason: "Cancelled before dispatch".to_string(),
                    cancelled: true,
                }),
            }
        }

        let outcome = AssessmentOutcome::new(section_id, document_class, results, failures, cache_hits);
        tracing::info!(
            section_id = %outcome.section_id,
            document_class,
            tasks = task_count,
            attributes = outcome.results.len(),
            alerts = outcome.alerts.len(),
            failures = outcome.failures.len(),
            cache_hits = outcome.cache_hits,
            "Section assessed"
        );
        Ok(outcome)
    }

    async fn assess_task(
        &self,
        task_id: TaskId,
        document_class: &str,
        targets: Vec<ConfidenceTarget>,
        model: &str,
    ) -> TaskAssessment {
        if targets.is_empty() {
            return TaskAssessment {
                results: Vec::new(),
                failure: None,
                cache_hit: false,
            };
        }

        let key = confidence_cache_key(document_class, &targets, model);
        if let Some(cached) = self.cached(&key, &targets).await {
            tracing::debug!(task_id = %task_id, "Confidence cache hit");
            return TaskAssessment {
                results: self.to_results(&targets, &cached.entries),
                failure: None,
                cache_hit: true,
            };
        }

        tracing::debug!(task_id = %task_id, attributes = targets.len(), "Requesting confidence");
        let request = CompletionRequest::new(RequestMetadata::new(
            CallPurpose::Confidence,
            task_id.to_string(),
            self.trace_id.clone(),
        ))
        .with_system_prompt(CONFIDENCE_SYSTEM_PROMPT)
        .with_message(MessageRole::User, build_confidence_prompt(document_class, &targets))
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens);

        let response = match self.llm.complete(request).await {
            Ok(response) => response,
            Err(error) => {
                let error = error.to_endpoint_error(CONFIDENCE_ENDPOINT);
                tracing::error!(task_id = %task_id, error = %error, "Confidence task failed");
                return TaskAssessment::failed(TaskFailure {
                    task_id,
                    attributes: targets.into_iter().map(|t| t.path).collect(),
                    reason: error.to_string(),
                    cancelled: false,
                });
            }
        };

        match parse_confidence_response(&response.content, &targets) {
            Ok(entries) => {
                self.store(&key, model, &entries).await;
                TaskAssessment {
                    results: self.to_results(&targets, &entries),
                    failure: None,
                    cache_hit: false,
                }
            }
            Err(malformed) => {
                tracing::warn!(task_id = %task_id, reason = %malformed.reason, "Malformed confidence response");
                let reason = malformed.to_reason_text();
                let entries: Vec<AttributeConfidence> = targets
                    .iter()
                    .map(|target| AttributeConfidence {
                        path: target.path.clone(),
                        confidence: Score::ZERO,
                        reason: reason.clone(),
                    })
                    .collect();
                TaskAssessment {
                    results: self.to_results(&targets, &entries),
                    failure: None,
                    cache_hit: false,
                }
            }
        }
    }

    async fn cached(&self, key: &str, targets: &[ConfidenceTarget]) -> Option<CachedConfidence> {
        let cache = self.cache.as_ref()?;
        match cache.get(key).await {
            Ok(Some(cached)) if cached.entries.len() == targets.len() => Some(cached),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(key, error = %error, "Confidence cache read failed");
                None
            }
        }
    }

    async fn store(&self, key: &str, model: &str, entries: &[AttributeConfidence]) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let value = CachedConfidence {
            model: model.to_string(),
            entries: entries.to_vec(),
            cached_at: Timestamp::now(),
        };
        if let Err(error) = cache.put(key, &value).await {
            tracing::warn!(key, error = %error, "Confidence cache write failed");
        }
    }

    fn to_results(&self, targets: &[ConfidenceTarget], entries: &[AttributeConfidence]) -> Vec<AttributeResult> {
        targets
            .iter()
            .zip(entries)
            .map(|(target, entry)| {
                AttributeResult::assessed(
                    target.path.clone(),
                    target.name.clone(),
                    target.value.clone(),
                    entry.confidence,
                    target
                        .confidence_threshold
                        .unwrap_or(self.settings.default_confidence_threshold),
                    entry.reason.clone(),
                    target.weight,
                )
            })
            .collect()
    }
}

fn task_paths(task: &ComparisonTask) -> Vec<String> {
    task.attribute_paths().into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryResultCache;
    use crate::adapters::llm::MockLlmProvider;
    use crate::domain::decomposition::DecomposerConfig;
    use crate::ports::LlmError;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "Merchant": {"type": "string", "x-confidence-threshold": 0.9},
                "Total": {"type": "number"},
                "Address": {
                    "type": "object",
                    "properties": {"City": {"type": "string"}}
                }
            }
        })
    }

    fn actual() -> Value {
        json!({"Merchant": "Corner Shop", "Total": 12.5, "Address": {"City": "Leeds"}})
    }

    fn assessor(llm: MockLlmProvider) -> ConfidenceAssessor {
        ConfidenceAssessor::new(
            Arc::new(SchemaResolver::new()),
            TaskDecomposer::new(DecomposerConfig { max_batch_size: 5 }),
            Arc::new(llm),
            WorkerPool::with_workers(2),
            AssessorSettings::default(),
        )
    }

    fn section() -> SectionId {
        SectionId::new("p1").unwrap()
    }

    fn responder(request: &CompletionRequest) -> Result<String, LlmError> {
        let prompt = request.last_user_message().unwrap_or_default();
        if prompt.contains("Address.City") {
            Ok(r#"{"Address.City": {"confidence": 0.3, "reason": "smudged"}}"#.into())
        } else {
            Ok(r#"{"Merchant": {"confidence": 0.85, "reason": "legible"}, "Total": 0.99}"#.into())
        }
    }

    #[tokio::test]
    async fn rates_every_leaf_and_raises_alerts() {
        let outcome = assessor(MockLlmProvider::new().with_responder(responder))
            .assess(section(), "receipt", Some(&schema()), &actual(), None)
            .await
            .unwrap();

        assert!(outcome.is_complete());
        let paths: Vec<_> = outcome.results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["Merchant", "Total", "Address.City"]);
        assert!(outcome.results.iter().all(|r| r.matched.is_none()));

        let alerted: Vec<_> = outcome.alerts.iter().map(|a| a.attribute_name.as_str()).collect();
        assert_eq!(alerted, vec!["Merchant", "Address.City"]);
        assert_eq!(outcome.alerts[0].confidence_threshold, 0.9);
        assert_eq!(outcome.alerts[1].confidence_threshold, 0.8);
    }

    #[tokio::test]
    async fn endpoint_failure_is_recorded_per_task() {
        let llm = MockLlmProvider::new().with_responder(|request| {
            if request.last_user_message().unwrap_or_default().contains("Address.City") {
                Err(LlmError::rate_limited(None))
            } else {
                responder(request)
            }
        });

        let outcome = assessor(llm)
            .assess(section(), "receipt", Some(&schema()), &actual(), None)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert_eq!(failure.attributes, vec!["Address.City".to_string()]);
        assert!(!failure.cancelled);
        assert!(failure.reason.contains(CONFIDENCE_ENDPOINT));
    }

    #[tokio::test]
    async fn malformed_response_yields_zero_confidence_and_is_not_cached() {
        let cache = Arc::new(InMemoryResultCache::new());
        let llm = MockLlmProvider::new().with_responder(|_| Ok("I cannot rate these.".into()));
        let assessor = assessor(llm.clone()).with_cache(cache.clone());

        let outcome = assessor
            .assess(section(), "receipt", Some(&schema()), &actual(), None)
            .await
            .unwrap();

        assert!(outcome.is_complete());
        assert!(outcome
            .results
            .iter()
            .all(|r| r.confidence == Some(Score::ZERO) && r.reason.contains("I cannot rate these.")));
        assert_eq!(outcome.alerts.len(), 3);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn second_run_is_served_from_cache() {
        let cache = Arc::new(InMemoryResultCache::new());
        let llm = MockLlmProvider::new().with_responder(responder);
        let assessor = assessor(llm.clone()).with_cache(cache);

        let first = assessor
            .assess(section(), "receipt", Some(&schema()), &actual(), None)
            .await
            .unwrap();
        let calls = llm.call_count();
        let second = assessor
            .assess(section(), "receipt", Some(&schema()), &actual(), None)
            .await
            .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(llm.call_count(), calls);
        assert_eq!(second.cache_hits, 2);
        assert_eq!(first.results, second.results);
    }

    #[tokio::test]
    async fn cancelled_run_reports_unstarted_tasks() {
        let (tx, rx) = watch::channel(true);
        let llm = MockLlmProvider::new().with_responder(responder);

        let outcome = assessor(llm.clone())
            .assess(section(), "receipt", Some(&schema()), &actual(), Some(rx))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(llm.call_count(), 0);
        assert_eq!(outcome.cancelled_count(), 2);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn missing_schema_is_an_error() {
        let result = assessor(MockLlmProvider::new())
            .assess(section(), "receipt", None, &actual(), None)
            .await;
        assert!(matches!(
            result,
            Err(EngineError::SchemaResolution(SchemaResolutionError::MissingSchema { .. }))
        ));
    }
}
