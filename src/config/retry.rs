//! Retry configuration for inference endpoints

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::ports::RetryPolicy;

/// Bounded exponential backoff settings
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Fraction of each delay removed at random
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl RetryConfig {
    /// Builds the policy applied by the retrying adapters.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            self.jitter,
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::OutOfRange {
                field: "retry.max_attempts",
                reason: "must be at least 1",
            });
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ValidationError::InvalidRetryDelays);
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ValidationError::OutOfRange {
                field: "retry.jitter",
                reason: "must be within [0, 1]",
            });
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    32_000
}

fn default_jitter() -> f64 {
    0.25
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_defaults() {
        let policy = RetryConfig::default().to_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(32));
        assert_eq!(policy.jitter, 0.25);
        assert!(policy.should_retry(&crate::ports::LlmError::rate_limited(None), 1));
    }

    #[test]
    fn test_max_delay_below_base_is_invalid() {
        let config = RetryConfig {
            base_delay_ms: 5000,
            max_delay_ms: 1000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRetryDelays)));
    }

    #[test]
    fn test_zero_attempts_is_invalid() {
        let config = RetryConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
