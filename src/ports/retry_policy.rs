//! Retry policy for calls to external endpoints.
//!
//! The policy is a plain value: attempt budget, backoff curve and a
//! retryable-predicate. Wrappers in the adapter layer apply it to calls.
//!
//! ```text
//! delay(n) = min(max_delay, max(base_delay * 2^(n-1), server hint)),
//!            then scaled by a random factor in [1 - jitter, 1]
//! ```

use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::LlmError;

/// Decides whether an error is worth another attempt.
pub type RetryPredicate = Arc<dyn Fn(&LlmError) -> bool + Send + Sync>;

/// Configuration for retrying external calls.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    ///
    /// Default: 5
    pub max_attempts: u32,

    /// Delay before the first retry.
    ///
    /// Default: 1 second
    pub base_delay: Duration,

    /// Upper bound on any single delay.
    ///
    /// Default: 32 seconds
    pub max_delay: Duration,

    /// Fraction of each delay that may be removed at random, in `[0, 1]`.
    ///
    /// Default: 0.25
    pub jitter: f64,

    predicate: RetryPredicate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            jitter: 0.25,
            predicate: Arc::new(LlmError::is_retryable),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("jitter", &self.jitter)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Policy retrying every retryable `LlmError`.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration, jitter: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            jitter,
            predicate: Arc::new(LlmError::is_retryable),
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Retries immediately; for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO, 0.0)
    }

    /// Replaces the retryable-predicate.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&LlmError) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }

    /// Whether `error`, seen on attempt number `attempt` (1-based), should
    /// be retried.
    pub fn should_retry(&self, error: &LlmError, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1) && (self.predicate)(error)
    }

    /// Deterministic backoff before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self
            .base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        match retry_after {
            Some(hint) if hint > delay => hint.min(self.max_delay),
            _ => delay,
        }
    }

    /// Backoff with random jitter applied.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = self.backoff(attempt, retry_after);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 || delay.is_zero() {
            return delay;
        }
        let factor = rand::rng().random_range((1.0 - jitter)..=1.0);
        let jittered = delay.mul_f64(factor);
        // A server hint is a floor, up to max_delay.
        match retry_after {
            Some(hint) => jittered.max(hint.min(self.max_delay)),
            None => jittered,
        }
    }
}
