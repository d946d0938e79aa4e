//! Retry policy for a fetch stage.

use std::time::Duration;

use crate::error::FetchError;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default number of attempts per stage.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How many times a stage tries its target, and for how long each time.
///
/// Attempts are sequential and immediate; there is no delay between them.
/// The invariants `max_attempts >= 1` and `timeout_per_attempt > 0` are
/// checked on construction, so a `RetryPolicy` value is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    timeout_per_attempt: Duration,
    max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy, validating both values.
    pub fn new(timeout_per_attempt: Duration, max_attempts: u32) -> Result<Self, FetchError> {
        if max_attempts == 0 {
            return Err(FetchError::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if timeout_per_attempt.is_zero() {
            return Err(FetchError::InvalidPolicy(
                "timeout_per_attempt must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            timeout_per_attempt,
            max_attempts,
        })
    }

    /// Creates a policy from a millisecond timeout.
    pub fn from_millis(timeout_ms: u64, max_attempts: u32) -> Result<Self, FetchError> {
        Self::new(Duration::from_millis(timeout_ms), max_attempts)
    }

    /// A policy that makes exactly one attempt.
    pub fn single_attempt(timeout_per_attempt: Duration) -> Result<Self, FetchError> {
        Self::new(timeout_per_attempt, 1)
    }

    /// Returns the per-attempt timeout.
    pub fn timeout_per_attempt(&self) -> Duration {
        self.timeout_per_attempt
    }

    /// Returns the attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound on how long an exhausted stage can take.
    pub fn worst_case_duration(&self) -> Duration {
        self.timeout_per_attempt.saturating_mul(self.max_attempts)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout_per_attempt: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}
