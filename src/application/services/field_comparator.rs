//! FieldComparator - Compares one expected value with one actual value.
//!
//! Lexical methods run the pure kernels in `domain::comparison`. SEMANTIC
//! and LLM call out through the embedding and LLM ports. Endpoint failures
//! and unparseable judge output never escape: they become zero-score
//! outcomes whose reason says what went wrong.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::comparison::{
    build_judge_prompt, compare_exact, compare_fuzzy, compare_numeric, compare_presence,
    cosine_similarity, normalize_exact, parse_judge_response, semantic_outcome, value_to_text,
    ComparisonOutcome, JUDGE_SYSTEM_PROMPT,
};
use crate::domain::foundation::ComparisonConfigError;
use crate::domain::schema::{EvaluationMethod, MethodDefaults, NodeKind, SchemaNode};
use crate::ports::{
    CallPurpose, CompletionRequest, EmbeddingProvider, LlmProvider, MessageRole, RequestMetadata,
};

/// Generation and threshold settings for comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparatorSettings {
    pub defaults: MethodDefaults,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ComparatorSettings {
    fn default() -> Self {
        Self {
            defaults: MethodDefaults::default(),
            temperature: 0.0,
            max_tokens: 512,
        }
    }
}

/// Field comparator.
pub struct FieldComparator {
    settings: ComparatorSettings,
    llm: Option<Arc<dyn LlmProvider>>,
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    trace_id: String,
}

impl FieldComparator {
    pub fn new(settings: ComparatorSettings) -> Self {
        Self {
            settings,
            llm: None,
            embeddings: None,
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Enables the LLM method.
    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Enables the SEMANTIC method.
    pub fn with_embeddings(mut self, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Trace id attached to every endpoint request.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    pub fn defaults(&self) -> &MethodDefaults {
        &self.settings.defaults
    }

    /// Verifies every method in `node` can run with the configured endpoints.
    pub fn check_node(&self, node: &SchemaNode, path: &str) -> Result<(), ComparisonConfigError> {
        if let Some(method) = node.directives.method {
            self.check_method(method)?;
        }
        match &node.kind {
            NodeKind::Scalar(_) => Ok(()),
            NodeKind::Object { properties } => properties
                .iter()
                .try_for_each(|child| self.check_node(child, &join_path(path, &child.name))),
            NodeKind::Array { items } => self.check_node(items, &format!("{}[]", path)),
        }
    }

    fn check_method(&self, method: EvaluationMethod) -> Result<(), ComparisonConfigError> {
        let available = match method {
            EvaluationMethod::Semantic => self.embeddings.is_some(),
            EvaluationMethod::Llm => self.llm.is_some(),
            _ => true,
        };
        if available {
            Ok(())
        } else {
            Err(ComparisonConfigError::MissingEndpoint {
                method: method.to_string(),
            })
        }
    }

    /// Compares a unit node's values with its effective method and threshold.
    pub async fn compare_node_values(
        &self,
        path: &str,
        node: &SchemaNode,
        expected: &Value,
        actual: &Value,
    ) -> Result<ComparisonOutcome, ComparisonConfigError> {
        let method = node.effective_method();
        if method == EvaluationMethod::Hungarian {
            return Err(ComparisonConfigError::MethodNotApplicable {
                method: method.to_string(),
                kind: node.kind.label().to_string(),
                path: path.to_string(),
            });
        }
        let threshold = node.effective_threshold(&self.settings.defaults);
        self.compare(path, node.description.as_deref(), expected, actual, method, threshold)
            .await
    }

    /// Compares two values.
    ///
    /// Both-empty pairs match regardless of method. HUNGARIAN is a list
    /// method and is rejected here.
    pub async fn compare(
        &self,
        path: &str,
        description: Option<&str>,
        expected: &Value,
        actual: &Value,
        method: EvaluationMethod,
        threshold: f64,
    ) -> Result<ComparisonOutcome, ComparisonConfigError> {
        if let Some(outcome) = compare_presence(expected, actual, threshold) {
            return Ok(outcome);
        }

        let outcome = match method {
            EvaluationMethod::Exact => compare_exact(expected, actual),
            EvaluationMethod::NumericExact => compare_numeric(expected, actual, threshold),
            EvaluationMethod::Fuzzy => compare_fuzzy(expected, actual, threshold),
            EvaluationMethod::Semantic => self.compare_semantic(path, expected, actual, threshold).await?,
            EvaluationMethod::Llm => {
                self.compare_with_judge(path, description, expected, actual, threshold)
                    .await?
            }
            EvaluationMethod::Hungarian => {
                return Err(ComparisonConfigError::MethodNotApplicable {
                    method: method.to_string(),
                    kind: "scalar".to_string(),
                    path: path.to_string(),
                })
            }
        };

        tracing::debug!(
            path,
            method = %method,
            matched = outcome.matched,
            score = outcome.score.value(),
            "Compared field"
        );
        Ok(outcome)
    }

    async fn compare_semantic(
        &self,
        path: &str,
        expected: &Value,
        actual: &Value,
        threshold: f64,
    ) -> Result<ComparisonOutcome, ComparisonConfigError> {
        let embeddings = self.embeddings.as_ref().ok_or_else(|| ComparisonConfigError::MissingEndpoint {
            method: EvaluationMethod::Semantic.to_string(),
        })?;

        let texts = [
            normalize_exact(&value_to_text(expected)),
            normalize_exact(&value_to_text(actual)),
        ];
        match embeddings.embed(&texts).await {
            Ok(vectors) if vectors.len() == 2 => {
                Ok(semantic_outcome(cosine_similarity(&vectors[0], &vectors[1]), threshold))
            }
            Ok(vectors) => Ok(ComparisonOutcome::unmatched(
                threshold,
                format!("Embedding endpoint returned {} vectors for 2 inputs", vectors.len()),
            )),
            Err(err) => {
                let error = err.to_endpoint_error("embedding");
                tracing::error!(path, error = %error, "Semantic comparison failed");
                Ok(ComparisonOutcome::unmatched(
                    threshold,
                    format!("Semantic comparison failed: {}", error),
                ))
            }
        }
    }

    async fn compare_with_judge(
        &self,
        path: &str,
        description: Option<&str>,
        expected: &Value,
        actual: &Value,
        threshold: f64,
    ) -> Result<ComparisonOutcome, ComparisonConfigError> {
        let llm = self.llm.as_ref().ok_or_else(|| ComparisonConfigError::MissingEndpoint {
            method: EvaluationMethod::Llm.to_string(),
        })?;

        let request = CompletionRequest::new(RequestMetadata::new(
            CallPurpose::Judge,
            path,
            self.trace_id.clone(),
        ))
        .with_system_prompt(JUDGE_SYSTEM_PROMPT)
        .with_message(MessageRole::User, build_judge_prompt(path, description, expected, actual))
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens);

        let response = match llm.complete(request).await {
            Ok(response) => response,
            Err(err) => {
                let error = err.to_endpoint_error("llm");
                tracing::error!(path, error = %error, "LLM judge call failed");
                return Ok(ComparisonOutcome::unmatched(
                    threshold,
                    format!("LLM judge failed: {}", error),
                ));
            }
        };

        Ok(match parse_judge_response(&response.content) {
            Ok(verdict) => ComparisonOutcome::scored(verdict.score.value(), threshold, verdict.reason),
            Err(malformed) => {
                tracing::warn!(path, reason = %malformed.reason, "Unparseable judge response");
                ComparisonOutcome::unmatched(threshold, malformed.to_reason_text())
            }
        })
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}.{}", parent, child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::{MockEmbeddingProvider, MockLlmProvider};
    use crate::domain::schema::ScalarType;
    use crate::ports::LlmError;
    use proptest::prelude::*;
    use serde_json::json;

    fn comparator() -> FieldComparator {
        FieldComparator::new(ComparatorSettings::default())
    }

    async fn run(
        comparator: &FieldComparator,
        e: Value,
        a: Value,
        method: EvaluationMethod,
        threshold: f64,
    ) -> ComparisonOutcome {
        comparator
            .compare("field", None, &e, &a, method, threshold)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn both_empty_matches_for_every_method() {
        let c = comparator()
            .with_llm(Arc::new(MockLlmProvider::new()))
            .with_embeddings(Arc::new(MockEmbeddingProvider::new()));
        for method in EvaluationMethod::ALL {
            if method == EvaluationMethod::Hungarian {
                continue;
            }
            let outcome = run(&c, Value::Null, json!("  "), method, 0.9).await;
            assert!(outcome.matched, "{}", method);
            assert_eq!(outcome.score.value(), 1.0);
        }
    }

    #[tokio::test]
    async fn exact_ignores_trailing_punctuation() {
        let outcome = run(&comparator(), json!("Acme Corp."), json!(" Acme Corp"), EvaluationMethod::Exact, 1.0).await;
        assert!(outcome.matched);
        let outcome = run(&comparator(), json!("acme corp"), json!("Acme Corp"), EvaluationMethod::Exact, 1.0).await;
        assert!(!outcome.matched);
    }

    #[tokio::test]
    async fn numeric_uses_tolerance() {
        let outcome = run(&comparator(), json!(100.0), json!("$100.004"), EvaluationMethod::NumericExact, 0.01).await;
        assert!(outcome.matched);
        let outcome = run(&comparator(), json!(100.0), json!(90), EvaluationMethod::NumericExact, 0.01).await;
        assert!(!outcome.matched);
        assert!((outcome.score.value() - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn semantic_uses_embeddings() {
        let c = comparator().with_embeddings(Arc::new(MockEmbeddingProvider::new()));
        let outcome = run(&c, json!("Acme Corp"), json!("ACME corp"), EvaluationMethod::Semantic, 0.8).await;
        assert!(outcome.matched);
    }

    #[tokio::test]
    async fn semantic_endpoint_failure_is_zero_score() {
        let embeddings = MockEmbeddingProvider::new().with_error(LlmError::AuthenticationFailed);
        let c = comparator().with_embeddings(Arc::new(embeddings));
        let outcome = run(&c, json!("a"), json!("b"), EvaluationMethod::Semantic, 0.8).await;
        assert!(!outcome.matched);
        assert_eq!(outcome.score.value(), 0.0);
        assert!(outcome.reason.contains("Semantic comparison failed"));
    }

    #[tokio::test]
    async fn judge_score_is_compared_with_threshold() {
        let llm = MockLlmProvider::new()
            .with_response(r#"{"match": true, "score": 0.7, "reason": "close"}"#)
            .with_response("```json\n{\"match\": true, \"score\": 0.95, \"reason\": \"same\"}\n```");
        let c = comparator().with_llm(Arc::new(llm.clone()));

        let low = run(&c, json!("12 Main St"), json!("12 Main Street"), EvaluationMethod::Llm, 0.8).await;
        assert!(!low.matched);
        assert_eq!(low.reason, "close");

        let high = run(&c, json!("12 Main St"), json!("12 Main Street"), EvaluationMethod::Llm, 0.8).await;
        assert!(high.matched);

        let calls = llm.get_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].metadata.purpose, CallPurpose::Judge);
        assert!(calls[0].last_user_message().unwrap().contains("12 Main Street"));
    }

    #[tokio::test]
    async fn malformed_judge_response_keeps_raw_text() {
        let llm = MockLlmProvider::new().with_response("I think they match");
        let c = comparator().with_llm(Arc::new(llm));
        let outcome = run(&c, json!("a"), json!("b"), EvaluationMethod::Llm, 0.8).await;
        assert!(!outcome.matched);
        assert!(outcome.reason.contains("I think they match"));
    }

    #[tokio::test]
    async fn judge_endpoint_failure_is_contained() {
        let llm = MockLlmProvider::new().with_error(LlmError::RetriesExhausted {
            attempts: 5,
            last: Box::new(LlmError::rate_limited(None)),
        });
        let c = comparator().with_llm(Arc::new(llm));
        let outcome = run(&c, json!("a"), json!("b"), EvaluationMethod::Llm, 0.8).await;
        assert_eq!(outcome.score.value(), 0.0);
        assert!(outcome.reason.contains("5 attempt"));
    }

    #[tokio::test]
    async fn missing_endpoint_is_configuration_error() {
        let err = comparator()
            .compare("f", None, &json!("a"), &json!("b"), EvaluationMethod::Llm, 0.8)
            .await
            .unwrap_err();
        assert!(matches!(err, ComparisonConfigError::MissingEndpoint { .. }));

        let node = SchemaNode::object(
            "Vendor",
            vec![SchemaNode::scalar("Name", ScalarType::String).with_method(EvaluationMethod::Semantic)],
        );
        assert!(comparator().check_node(&node, "Vendor").is_err());
    }

    #[tokio::test]
    async fn hungarian_is_not_a_field_method() {
        let err = comparator()
            .compare("f", None, &json!("a"), &json!("b"), EvaluationMethod::Hungarian, 0.8)
            .await
            .unwrap_err();
        assert!(matches!(err, ComparisonConfigError::MethodNotApplicable { .. }));
    }

    proptest! {
        #[test]
        fn exact_is_reflexive(text in "[ -~]{0,40}") {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let outcome = rt.block_on(run(&comparator(), json!(text.clone()), json!(text), EvaluationMethod::Exact, 1.0));
            prop_assert!(outcome.matched);
            prop_assert_eq!(outcome.score.value(), 1.0);
        }
    }
}
