//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `EXTRACTION_EVAL` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use extraction_evaluator::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Evaluating with {} workers", config.evaluation.workers);
//! ```

mod error;
mod evaluation;
mod llm;
mod logging;
mod retry;

pub use error::{ConfigError, ValidationError};
pub use evaluation::{AssessmentConfig, EvaluationConfig};
pub use llm::{EmbeddingConfig, LlmConfig, LlmProviderKind};
pub use logging::{LogFormat, LoggingConfig};
pub use retry::RetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only the LLM API key is required when the
/// Anthropic provider is selected. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Completion endpoint (LLM judge and confidence scoring)
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding endpoint (SEMANTIC comparisons)
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Backoff applied to both endpoints
    #[serde(default)]
    pub retry: RetryConfig,

    /// Ground-truth evaluation
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Confidence assessment
    #[serde(default)]
    pub assessment: AssessmentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `EXTRACTION_EVAL` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `EXTRACTION_EVAL__LLM__MODEL=...` -> `llm.model = ...`
    /// - `EXTRACTION_EVAL__EVALUATION__WORKERS=20` -> `evaluation.workers = 20`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("EXTRACTION_EVAL")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.llm.validate()?;
        self.embedding.validate()?;
        self.retry.validate()?;
        self.evaluation.validate()?;
        self.assessment.validate()?;
        Ok(())
    }
}
