//! Retry policy for idempotent provider listings.

use std::fmt;
use std::time::Duration;

use super::error::ProviderError;

/// Attempts made by the default listing policy.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Fixed pause between listing attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: u32,
    },
}

/// How often and how patiently a provider call is repeated.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Never below 1.
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Errors for which another attempt is worthwhile.
    pub retryable: fn(&ProviderError) -> bool,
}

impl RetryPolicy {
    /// Fixed delay, every error retryable.
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed(delay),
            retryable: retry_any,
        }
    }

    /// A single attempt, for latency-sensitive request paths.
    #[must_use]
    pub fn once() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, retryable: fn(&ProviderError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Pause after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }

    /// Whether a failure on `attempt` (1-based) warrants another try.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
        attempt < self.max_attempts && (self.retryable)(error)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

#[must_use]
pub fn retry_any(_: &ProviderError) -> bool {
    true
}

/// A vanished resource or a bad profile will not fix itself.
#[must_use]
pub fn retry_transient(error: &ProviderError) -> bool {
    matches!(error, ProviderError::Api(_) | ProviderError::Decode(_))
}
