//! Retrying providers - Wrappers that apply a `RetryPolicy` to inference calls.
//!
//! Transient failures (rate limits, unavailability, transient model errors,
//! timeouts) are retried with exponential backoff. When the budget runs out
//! the caller sees `LlmError::RetriesExhausted` carrying the attempt count
//! and the last error. Non-retryable errors surface on the first attempt.
//!
//! # Example
//!
//! ```ignore
//! let provider = RetryingLlmProvider::new(AnthropicProvider::new(config)?, RetryPolicy::default());
//! ```

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    CompletionRequest, CompletionResponse, EmbeddingProvider, LlmError, LlmProvider, ProviderInfo,
    RetryPolicy,
};

/// Runs `call` until it succeeds or the policy gives up.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut call: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if policy.should_retry(&err, attempt) => {
                let hint = err.retry_after_secs().map(|s| Duration::from_secs(s as u64));
                let delay = policy.delay_for(attempt, hint);
                tracing::warn!(
                    endpoint = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient endpoint failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) if attempt > 1 => {
                tracing::error!(endpoint = label, attempts = attempt, error = %err, "Endpoint retries exhausted");
                return Err(LlmError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            Err(err) => return Err(err),
        }
    }
}

/// LLM provider wrapper that retries transient failures.
pub struct RetryingLlmProvider<P: LlmProvider> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: LlmProvider> RetryingLlmProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: LlmProvider + 'static> LlmProvider for RetryingLlmProvider<P> {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let label = self.inner.provider_info().name;
        with_retry(&self.policy, &label, || self.inner.complete(request.clone())).await
    }

    fn provider_info(&self) -> ProviderInfo {
        self.inner.provider_info()
    }
}

/// Embedding provider wrapper that retries transient failures.
pub struct RetryingEmbeddingProvider<E: EmbeddingProvider> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: EmbeddingProvider> RetryingEmbeddingProvider<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: EmbeddingProvider + 'static> EmbeddingProvider for RetryingEmbeddingProvider<E> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        with_retry(&self.policy, "embedding", || self.inner.embed(texts)).await
    }

    fn model_id(&self) -> String {
        self.inner.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::{MockEmbeddingProvider, MockLlmProvider};
    use crate::ports::{CallPurpose, MessageRole, RequestMetadata};

    fn request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(CallPurpose::Judge, "name", "trace"))
            .with_message(MessageRole::User, "compare")
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let mock = MockLlmProvider::new()
            .with_error(LlmError::rate_limited(None))
            .with_error(LlmError::unavailable("overloaded"))
            .with_response("ok");
        let provider = RetryingLlmProvider::new(mock, RetryPolicy::immediate(5));

        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(provider.inner().call_count(), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_reports_attempts() {
        let mock = MockLlmProvider::new()
            .with_error(LlmError::model_transient("busy"))
            .with_error(LlmError::model_transient("busy"))
            .with_error(LlmError::model_transient("busy"));
        let provider = RetryingLlmProvider::new(mock, RetryPolicy::immediate(3));

        let err = provider.complete(request()).await.unwrap_err();
        assert_eq!(err.attempts(), 3);
        assert!(matches!(err.root_cause(), LlmError::ModelTransient { .. }));
        assert_eq!(provider.inner().call_count(), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_is_not_retried() {
        let mock = MockLlmProvider::new()
            .with_error(LlmError::AuthenticationFailed)
            .with_response("never");
        let provider = RetryingLlmProvider::new(mock, RetryPolicy::immediate(5));

        let err = provider.complete(request()).await.unwrap_err();
        assert_eq!(err, LlmError::AuthenticationFailed);
        assert_eq!(provider.inner().call_count(), 1);
    }

    #[tokio::test]
    async fn custom_predicate_narrows_retries() {
        let mock = MockLlmProvider::new()
            .with_error(LlmError::content_filtered("policy"))
            .with_response("ok");
        let policy = RetryPolicy::immediate(5)
            .with_predicate(|e| matches!(e, LlmError::RateLimited { .. }));
        let provider = RetryingLlmProvider::new(mock, policy);

        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::ContentFiltered { .. }));
    }

    #[tokio::test]
    async fn embeddings_are_retried() {
        let mock = MockEmbeddingProvider::new().with_error(LlmError::Timeout { timeout_secs: 5 });
        let provider = RetryingEmbeddingProvider::new(mock, RetryPolicy::immediate(2));

        let vectors = provider.embed(&["a".to_string()]).await.unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(provider.inner().call_count(), 2);
    }
}
