//! OpenAI Embedding Provider - Implementation of EmbeddingProvider for
//! OpenAI-compatible `/embeddings` endpoints.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIEmbeddingConfig::new(api_key)
//!     .with_model("text-embedding-3-small")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIEmbeddingProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{EmbeddingProvider, LlmError};

/// Configuration for the embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAIEmbeddingConfig {
    api_key: Secret<String>,
    /// Model to use (e.g., "text-embedding-3-small").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAIEmbeddingConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI-compatible embedding provider.
pub struct OpenAIEmbeddingProvider {
    config: OpenAIEmbeddingConfig,
    client: Client,
}

impl OpenAIEmbeddingProvider {
    /// Creates a new provider with the given configuration.
    pub fn new(config: OpenAIEmbeddingConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::validation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_request(&self, texts: &[String]) -> Result<Response, LlmError> {
        let body = EmbeddingRequest {
            model: self.config.model.clone(),
            input: texts.to_vec(),
        };

        self.client
            .post(self.embeddings_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {}", e))
                } else {
                    LlmError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 | 403 => LlmError::AuthenticationFailed,
            429 => LlmError::rate_limited(None),
            400 => LlmError::validation(error_body),
            500..=599 => LlmError::unavailable(format!("Server error {}: {}", status, error_body)),
            _ => LlmError::validation(format!("Unexpected status {}: {}", status, error_body)),
        })
    }

    fn into_vectors(response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        if data.len() != expected {
            return Err(LlmError::parse(format!(
                "expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self.send_request(texts).await?;
        let response = self.handle_response_status(response).await?;
        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::parse(format!("Failed to parse response: {}", e)))?;
        Self::into_vectors(parsed, texts.len())
    }

    fn model_id(&self) -> String {
        self.config.model.clone()
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = OpenAIEmbeddingConfig::new("key")
            .with_model("text-embedding-3-large")
            .with_base_url("http://localhost:8080/v1/")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.model, "text-embedding-3-large");
        assert_eq!(config.api_key(), "key");

        let provider = OpenAIEmbeddingProvider::new(config).unwrap();
        assert_eq!(provider.embeddings_url(), "http://localhost:8080/v1/embeddings");
        assert_eq!(provider.model_id(), "text-embedding-3-large");
    }

    #[test]
    fn vectors_are_ordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [{"index": 1, "embedding": [0.0, 1.0]}, {"index": 0, "embedding": [1.0, 0.0]}]}"#,
        )
        .unwrap();
        let vectors = OpenAIEmbeddingProvider::into_vectors(response, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn count_mismatch_is_parse_error() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data": [{"index": 0, "embedding": [1.0]}]}"#).unwrap();
        assert!(matches!(
            OpenAIEmbeddingProvider::into_vectors(response, 2),
            Err(LlmError::Parse(_))
        ));
    }
}
