//! Evaluation and assessment engine configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::decomposition::DecomposerConfig;
use crate::domain::schema::MethodDefaults;

const MAX_WORKERS: usize = 100;

/// Ground-truth evaluation settings
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    /// Top-level scalars per comparison task
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Concurrent comparisons per pool
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_threshold")]
    pub item_threshold: f64,

    #[serde(default = "default_threshold")]
    pub fuzzy_threshold: f64,

    #[serde(default = "default_threshold")]
    pub semantic_threshold: f64,

    #[serde(default = "default_threshold")]
    pub llm_threshold: f64,

    #[serde(default = "default_numeric_tolerance")]
    pub numeric_tolerance: f64,

    /// Object-store prefix for report artifacts
    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,
}

impl EvaluationConfig {
    pub fn method_defaults(&self) -> MethodDefaults {
        MethodDefaults {
            numeric_tolerance: self.numeric_tolerance,
            fuzzy_threshold: self.fuzzy_threshold,
            semantic_threshold: self.semantic_threshold,
            llm_threshold: self.llm_threshold,
            item_threshold: self.item_threshold,
        }
    }

    pub fn decomposer_config(&self) -> DecomposerConfig {
        DecomposerConfig {
            max_batch_size: self.max_batch_size,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_batch_size == 0 {
            return Err(ValidationError::OutOfRange {
                field: "evaluation.max_batch_size",
                reason: "must be at least 1",
            });
        }
        validate_workers("evaluation.workers", self.workers)?;
        for (field, value) in [
            ("evaluation.item_threshold", self.item_threshold),
            ("evaluation.fuzzy_threshold", self.fuzzy_threshold),
            ("evaluation.semantic_threshold", self.semantic_threshold),
            ("evaluation.llm_threshold", self.llm_threshold),
        ] {
            validate_threshold(field, value)?;
        }
        if self.numeric_tolerance < 0.0 || self.numeric_tolerance.is_nan() {
            return Err(ValidationError::OutOfRange {
                field: "evaluation.numeric_tolerance",
                reason: "must not be negative",
            });
        }
        if self.report_prefix.trim().is_empty() {
            return Err(ValidationError::MissingRequired("EVALUATION__REPORT_PREFIX"));
        }
        Ok(())
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            workers: default_workers(),
            item_threshold: default_threshold(),
            fuzzy_threshold: default_threshold(),
            semantic_threshold: default_threshold(),
            llm_threshold: default_threshold(),
            numeric_tolerance: default_numeric_tolerance(),
            report_prefix: default_report_prefix(),
        }
    }
}

/// Confidence assessment settings
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Applied where the schema sets no `x-confidence-threshold`
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,

    /// Directory for the file-backed result cache; in-memory when unset
    pub cache_dir: Option<PathBuf>,
}

impl AssessmentConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_workers("assessment.workers", self.workers)?;
        validate_threshold("assessment.confidence_threshold", self.confidence_threshold)
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            confidence_threshold: default_threshold(),
            cache_dir: None,
        }
    }
}

fn validate_workers(field: &'static str, workers: usize) -> Result<(), ValidationError> {
    if workers == 0 || workers > MAX_WORKERS {
        return Err(ValidationError::OutOfRange {
            field,
            reason: "must be within 1..=100",
        });
    }
    Ok(())
}

fn validate_threshold(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            reason: "must be within [0, 1]",
        });
    }
    Ok(())
}

fn default_max_batch_size() -> usize {
    5
}

fn default_workers() -> usize {
    10
}

fn default_threshold() -> f64 {
    0.8
}

fn default_numeric_tolerance() -> f64 {
    0.0001
}

fn default_report_prefix() -> String {
    "reports".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_defaults() {
        let config = EvaluationConfig::default();
        assert_eq!(config.max_batch_size, 5);
        assert_eq!(config.workers, 10);
        assert_eq!(config.report_prefix, "reports");
        assert_eq!(config.method_defaults(), MethodDefaults::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_worker_bounds() {
        for workers in [0, 101] {
            let config = EvaluationConfig {
                workers,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "workers = {}", workers);
        }
        let config = AssessmentConfig {
            workers: 100,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_bounds() {
        let config = EvaluationConfig {
            fuzzy_threshold: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::OutOfRange { field: "evaluation.fuzzy_threshold", .. })
        ));

        let config = AssessmentConfig {
            confidence_threshold: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_is_invalid() {
        let config = EvaluationConfig {
            max_batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
