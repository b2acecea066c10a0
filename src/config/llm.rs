//! Inference endpoint configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// LLM completion endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Which provider backs judge and confidence calls
    #[serde(default)]
    pub provider: LlmProviderKind,

    /// Anthropic API key
    pub api_key: Option<String>,

    /// Override for the provider's base URL
    pub base_url: Option<String>,

    /// Model identifier, also part of the confidence cache key
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// LLM provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Anthropic,
    /// Offline runs; every call fails as unavailable unless scripted
    Mock,
}

impl LlmConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate LLM configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider == LlmProviderKind::Anthropic && !self.has_api_key() {
            return Err(ValidationError::MissingRequired("LLM__API_KEY"));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ValidationError::OutOfRange {
                field: "llm.temperature",
                reason: "must be within [0, 1]",
            });
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::OutOfRange {
                field: "llm.max_tokens",
                reason: "must be at least 1",
            });
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            api_key: None,
            base_url: None,
            model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Embedding endpoint configuration (SEMANTIC comparisons)
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible API key; SEMANTIC fields fail their section without one
    pub api_key: Option<String>,

    pub base_url: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_embedding_model(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout() -> u64 {
    120
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, LlmProviderKind::Anthropic);
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_anthropic_requires_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));

        let config = LlmConfig {
            api_key: Some("sk-ant-xxx".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mock_provider_needs_no_key() {
        let config = LlmConfig {
            provider: LlmProviderKind::Mock,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let config = LlmConfig {
            provider: LlmProviderKind::Mock,
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTimeout)));
    }

    #[test]
    fn test_embedding_defaults() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.model, "text-embedding-3-small");
        assert!(!config.has_api_key());
        assert!(config.validate().is_ok());
    }
}
