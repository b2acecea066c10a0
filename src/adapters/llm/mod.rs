//! Inference Adapters.
//!
//! Implementations of the `LlmProvider` and `EmbeddingProvider` ports.
//!
//! ## Available Adapters
//!
//! - `AnthropicProvider` - Anthropic Messages API, used as the judge and confidence model
//! - `OpenAIEmbeddingProvider` - OpenAI-compatible `/embeddings` endpoints
//! - `RetryingLlmProvider` / `RetryingEmbeddingProvider` - Apply a `RetryPolicy` to any provider
//! - `MockLlmProvider` / `MockEmbeddingProvider` - Configurable mocks for testing

mod anthropic_provider;
mod mock_provider;
mod openai_embedding_provider;
mod retrying_provider;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use mock_provider::{MockEmbeddingProvider, MockLlmProvider};
pub use openai_embedding_provider::{OpenAIEmbeddingConfig, OpenAIEmbeddingProvider};
pub use retrying_provider::{with_retry, RetryingEmbeddingProvider, RetryingLlmProvider};
