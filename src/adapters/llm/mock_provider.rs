//! Mock inference providers for testing.
//!
//! Lets tests run the engine without calling real endpoints.
//!
//! # Features
//!
//! - Queued responses and errors, consumed in order
//! - A responder closure for prompt-dependent answers
//! - Simulated delays for cancellation testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockLlmProvider::new()
//!     .with_response(r#"{"match": true, "score": 0.9, "reason": "same"}"#)
//!     .with_error(LlmError::rate_limited(Some(1)));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    CompletionRequest, CompletionResponse, EmbeddingProvider, LlmError, LlmProvider, ProviderInfo,
    TokenUsage,
};

type Responder = Arc<dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock LLM provider.
#[derive(Clone)]
pub struct MockLlmProvider {
    /// Pre-configured responses (consumed in order, before the responder).
    responses: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    responder: Option<Responder>,
    info: ProviderInfo,
    delay: Duration,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl std::fmt::Debug for MockLlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLlmProvider")
            .field("info", &self.info)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            responder: None,
            info: ProviderInfo::new("mock", "mock-model-1", 128_000),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        lock(&self.responses).push_back(Ok(content.into()));
        self
    }

    /// Adds an error to the queue.
    pub fn with_error(self, error: LlmError) -> Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// Answers calls once the queue is empty.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the reported model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.info.model = model.into();
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    fn next_response(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        if let Some(queued) = lock(&self.responses).pop_front() {
            return queued;
        }
        match &self.responder {
            Some(responder) => responder(request),
            None => Err(LlmError::unavailable("mock provider has no response queued")),
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        lock(&self.calls).push(request.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let content = self.next_response(&request)?;
        let mut response = CompletionResponse::new(content, self.info.model.clone());
        response.usage = TokenUsage::new(10, 20);
        Ok(response)
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

/// Mock embedding provider.
///
/// Embeds text as a bag of lowercase words hashed into a fixed number of
/// buckets, so identical word sets have cosine similarity 1 and disjoint
/// ones 0.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
    errors: Arc<Mutex<VecDeque<LlmError>>>,
    calls: Arc<Mutex<usize>>,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self {
            dimensions: 256,
            errors: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Fails the next call with `error`.
    pub fn with_error(self, error: LlmError) -> Self {
        lock(&self.errors).push_back(error);
        self
    }

    pub fn call_count(&self) -> usize {
        *lock(&self.calls)
    }

    fn bucket(&self, word: &str) -> usize {
        // FNV-1a, stable across runs.
        let hash = word
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(&word.to_lowercase())] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        *lock(&self.calls) += 1;
        if let Some(error) = lock(&self.errors).pop_front() {
            return Err(error);
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model_id(&self) -> String {
        "mock-embedding-1".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comparison::cosine_similarity;
    use crate::ports::{CallPurpose, RequestMetadata};

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(CallPurpose::Judge, "a", "t"))
            .with_message(crate::ports::MessageRole::User, text)
    }

    #[tokio::test]
    async fn queued_responses_come_first() {
        let provider = MockLlmProvider::new()
            .with_response("first")
            .with_error(LlmError::AuthenticationFailed)
            .with_responder(|r| Ok(format!("echo {}", r.last_user_message().unwrap_or_default())));

        assert_eq!(provider.complete(request("x")).await.unwrap().content, "first");
        assert_eq!(
            provider.complete(request("x")).await.unwrap_err(),
            LlmError::AuthenticationFailed
        );
        assert_eq!(provider.complete(request("y")).await.unwrap().content, "echo y");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn empty_mock_is_unavailable() {
        let provider = MockLlmProvider::new();
        let err = provider.complete(request("x")).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn embeddings_reflect_word_overlap() {
        let provider = MockEmbeddingProvider::new();
        let vectors = provider
            .embed(&[
                "Acme Corp".to_string(),
                "acme corp".to_string(),
                "zebra".to_string(),
            ])
            .await
            .unwrap();
        assert!((cosine_similarity(&vectors[0], &vectors[1]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&vectors[0], &vectors[2]) < 0.75);
    }
}
