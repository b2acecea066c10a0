//! LLM Provider Port - Interface for the external inference endpoint.
//!
//! The engine calls an LLM for two things: judging whether two field values
//! agree (the `LLM` evaluation method) and rating extracted values without
//! ground truth (confidence assessment). Both go through this port.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoProvider;
//!
//! #[async_trait]
//! impl LlmProvider for EchoProvider {
//!     async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
//!         Ok(CompletionResponse::new(request.last_user_message().unwrap_or_default(), "echo"))
//!     }
//!
//!     fn provider_info(&self) -> ProviderInfo {
//!         ProviderInfo::new("echo", "echo-1", 8_000)
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ExternalEndpointError;

/// Port for LLM completions.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Provider name, model and limits.
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for a completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    /// 0.0 is deterministic.
    pub temperature: Option<f32>,
    pub metadata: RequestMetadata,
}

impl CompletionRequest {
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            metadata,
        }
    }

    /// Appends a turn.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Content of the most recent user message.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// One turn of the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// What a call is for, for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPurpose {
    Judge,
    Confidence,
}

/// Request metadata for tracing.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub purpose: CallPurpose,
    /// Attribute path or task id the call serves.
    pub subject: String,
    pub trace_id: String,
}

impl RequestMetadata {
    pub fn new(purpose: CallPurpose, subject: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            purpose,
            subject: subject.into(),
            trace_id: trace_id.into(),
        }
    }
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub finish_reason: FinishReason,
}

impl CompletionResponse {
    /// A stopped response with zero usage.
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            model: model.into(),
            finish_reason: FinishReason::Stop,
        }
    }
}

/// Tokens billed for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
}

/// Identity of the configured endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    /// Model identifier; part of confidence cache keys.
    pub model: String,
    pub max_context_tokens: u32,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>, max_context_tokens: u32) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            max_context_tokens,
        }
    }
}

/// LLM endpoint errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    /// Throttled by the provider.
    #[error("rate limited{}", .retry_after_secs.map(|s| format!(": retry after {}s", s)).unwrap_or_default())]
    RateLimited {
        /// Server-provided retry hint.
        retry_after_secs: Option<u32>,
    },

    /// Provider is overloaded or temporarily unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// The model failed mid-generation and may succeed on retry.
    #[error("model error: {message}")]
    ModelTransient { message: String },

    /// Safety filter tripped; a resample may pass.
    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    /// Prompt exceeds the model's context window.
    #[error("context too long: {tokens} tokens exceeds {max} limit")]
    ContextTooLong { tokens: u32, max: u32 },

    /// Request was rejected as invalid.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Bad or missing API key.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse the provider's HTTP response.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    /// The retry policy gave up.
    #[error("gave up after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: Box<LlmError> },
}

impl LlmError {
    pub fn rate_limited(retry_after_secs: Option<u32>) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn model_transient(message: impl Into<String>) -> Self {
        Self::ModelTransient {
            message: message.into(),
        }
    }

    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Throttling, overload, transient model errors and content filtering
    /// are retryable; every other validation error is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. }
                | LlmError::Unavailable { .. }
                | LlmError::ModelTransient { .. }
                | LlmError::ContentFiltered { .. }
                | LlmError::Network(_)
                | LlmError::Timeout { .. }
        )
    }

    /// Server-provided delay hint, if any.
    pub fn retry_after_secs(&self) -> Option<u32> {
        match self {
            LlmError::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }

    /// Number of attempts this error represents.
    pub fn attempts(&self) -> u32 {
        match self {
            LlmError::RetriesExhausted { attempts, .. } => *attempts,
            _ => 1,
        }
    }

    /// Converts into the engine's endpoint error, keeping the attempt count.
    pub fn to_endpoint_error(&self, endpoint: &str) -> ExternalEndpointError {
        let cause = self.root_cause();
        ExternalEndpointError::new(endpoint, self.attempts(), cause.to_string(), cause.is_retryable())
    }

    /// The underlying error, unwrapping retry exhaustion.
    pub fn root_cause(&self) -> &LlmError {
        match self {
            LlmError::RetriesExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> RequestMetadata {
        RequestMetadata::new(CallPurpose::Judge, "Vendor.Name", "trace-123")
    }

    #[test]
    fn judge_request_carries_subject_and_settings() {
        let request = CompletionRequest::new(metadata())
            .with_message(MessageRole::User, "Hello")
            .with_system_prompt("Be strict")
            .with_max_tokens(100)
            .with_temperature(0.0);

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.system_prompt, Some("Be strict".to_string()));
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.metadata.subject, "Vendor.Name");
    }

    #[test]
    fn last_user_message_skips_assistant_turns() {
        let request = CompletionRequest::new(metadata())
            .with_message(MessageRole::User, "first")
            .with_message(MessageRole::Assistant, "reply")
            .with_message(MessageRole::User, "second");
        assert_eq!(request.last_user_message(), Some("second"));
    }

    #[test]
    fn usage_total_is_sum() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn retryable_classification() {
        assert!(LlmError::rate_limited(Some(3)).is_retryable());
        assert!(LlmError::unavailable("overloaded").is_retryable());
        assert!(LlmError::model_transient("stream reset").is_retryable());
        assert!(LlmError::content_filtered("safety").is_retryable());
        assert!(LlmError::Timeout { timeout_secs: 30 }.is_retryable());

        assert!(!LlmError::validation("bad field").is_retryable());
        assert!(!LlmError::AuthenticationFailed.is_retryable());
        assert!(!LlmError::ContextTooLong { tokens: 10, max: 5 }.is_retryable());
        assert!(!LlmError::parse("bad json").is_retryable());
    }

    #[test]
    fn exhausted_error_reports_attempts_and_cause() {
        let err = LlmError::RetriesExhausted {
            attempts: 5,
            last: Box::new(LlmError::rate_limited(None)),
        };
        assert_eq!(err.attempts(), 5);
        assert_eq!(err.root_cause(), &LlmError::rate_limited(None));
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "gave up after 5 attempt(s): rate limited");
    }

    #[test]
    fn rate_limited_display_includes_hint() {
        assert_eq!(
            LlmError::rate_limited(Some(7)).to_string(),
            "rate limited: retry after 7s"
        );
    }
}
