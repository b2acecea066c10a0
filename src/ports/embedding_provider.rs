//! Embedding Provider Port - Interface for text embedding endpoints.
//!
//! Used by the `SEMANTIC` evaluation method. Errors share the LLM error
//! taxonomy so the same retry policy applies.

use async_trait::async_trait;

use super::LlmError;

/// Port for text embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds each input text. The output has one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;

    /// Embedding model identifier.
    fn model_id(&self) -> String;
}
