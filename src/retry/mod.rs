//! Retry with exponential backoff and jitter
//!
//! [`RetryPolicy`] is immutable configuration; [`RetryExecutor`] runs an
//! async operation under a policy:
//!
//! 1. Invoke the operation (a fresh future per attempt, nothing shared).
//! 2. On error, stop if the error is not [`Retryable`] or attempts are exhausted.
//! 3. Otherwise wait `delay ± delay * jitter_ratio` (never negative), then
//!    grow `delay` by `multiplier`, capped at `max_backoff`.
//!
//! The last error is returned unchanged. Backoff waits are abandoned when the
//! attached [`CancelToken`] fires.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::cancel::CancelToken;
use crate::metrics;

pub mod context;

pub use context::RetryContext;

/// Default maximum attempts (first attempt + retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the first retry
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);
/// Default backoff growth factor
pub const DEFAULT_MULTIPLIER: f64 = 2.0;
/// Default backoff cap
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(4);
/// Default jitter ratio
pub const DEFAULT_JITTER_RATIO: f64 = 0.2;

/// Classification of errors that may succeed on a fresh attempt.
pub trait Retryable {
    /// Whether another attempt is worthwhile.
    fn is_retryable(&self) -> bool;
}

/// Retry policy configuration errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RetryPolicyError {
    /// Zero attempts would never run the operation
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    /// Backoff must not shrink
    #[error("multiplier must be finite and >= 1.0, got {0}")]
    InvalidMultiplier(f64),

    /// Jitter ratio outside [0, 1]
    #[error("jitter_ratio must be within [0, 1], got {0}")]
    InvalidJitter(f64),

    /// Cap below the starting delay
    #[error("max_backoff ({max:?}) must be >= initial_backoff ({initial:?})")]
    InvalidBackoffCap {
        /// Configured initial backoff
        initial: Duration,
        /// Configured cap
        max: Duration,
    },
}

/// Immutable retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Growth factor applied after every retry
    pub multiplier: f64,
    /// Upper bound on the un-jittered delay
    pub max_backoff: Duration,
    /// Relative jitter in [0, 1]
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            multiplier: DEFAULT_MULTIPLIER,
            max_backoff: DEFAULT_MAX_BACKOFF,
            jitter_ratio: DEFAULT_JITTER_RATIO,
        }
    }
}

impl RetryPolicy {
    /// Build and validate a policy.
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        multiplier: f64,
        max_backoff: Duration,
        jitter_ratio: f64,
    ) -> Result<Self, RetryPolicyError> {
        let policy = Self {
            max_attempts,
            initial_backoff,
            multiplier,
            max_backoff,
            jitter_ratio,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// A policy that runs the operation exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Check invariants.
    pub fn validate(&self) -> Result<(), RetryPolicyError> {
        if self.max_attempts == 0 {
            return Err(RetryPolicyError::ZeroAttempts);
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(RetryPolicyError::InvalidMultiplier(self.multiplier));
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(RetryPolicyError::InvalidJitter(self.jitter_ratio));
        }
        if self.max_backoff < self.initial_backoff {
            return Err(RetryPolicyError::InvalidBackoffCap {
                initial: self.initial_backoff,
                max: self.max_backoff,
            });
        }
        Ok(())
    }

    /// Un-jittered delay after `delay`: multiplied, capped at `max_backoff`.
    pub fn next_backoff(&self, delay: Duration) -> Duration {
        let grown = delay.as_secs_f64() * self.multiplier.max(1.0);
        Duration::try_from_secs_f64(grown).map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }

    /// Apply uniform jitter within `±(delay * jitter_ratio)`, clamped at zero.
    pub fn jittered<R: Rng + ?Sized>(&self, delay: Duration, rng: &mut R) -> Duration {
        let base = delay.as_secs_f64();
        let spread = base * self.jitter_ratio.clamp(0.0, 1.0);
        if spread <= 0.0 {
            return delay;
        }
        let lower = (base - spread).max(0.0);
        let upper = base + spread;
        Duration::from_secs_f64(rng.gen_range(lower..=upper))
    }

    /// Run `operation` under this policy with no cancellation hook.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        RetryExecutor::new(self.clone()).execute(operation).await
    }

    /// Run `operation` under this policy, abandoning backoff waits once
    /// `cancel` fires.
    pub async fn execute_with_cancel<T, E, F, Fut>(
        &self,
        operation: F,
        cancel: &CancelToken,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        RetryExecutor::new(self.clone())
            .with_cancel(cancel.clone())
            .execute(operation)
            .await
    }
}

/// Runs operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    cancel: Option<CancelToken>,
    label: String,
}

impl RetryExecutor {
    /// Create an executor for `policy`.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: None,
            label: String::new(),
        }
    }

    /// Abandon backoff waits (and further attempts) once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Attach a label (e.g., `USD->JPY`) to retry log messages.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Sleep for `delay`; returns `false` if cancelled first.
    async fn backoff(&self, delay: Duration) -> bool {
        match &self.cancel {
            Some(cancel) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => !cancel.is_cancelled(),
                    _ = cancel.cancelled() => false,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }

    /// Run `operation` up to `max_attempts` times.
    ///
    /// # Errors
    /// Returns the last error unchanged when it is not retryable, when
    /// attempts are exhausted, or when cancellation interrupts a backoff wait.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.initial_backoff;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            metrics::record_fetch_attempt();

            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, label = %self.label, "retry attempt succeeded");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let context = RetryContext::new(attempt, max_attempts, &self.label, err.to_string());

            if !err.is_retryable() {
                debug!(attempt, error = %err, label = %self.label, "non-retryable error");
                return Err(err);
            }

            if attempt >= max_attempts {
                error!("{}", context.format_failure());
                return Err(err);
            }

            if self.is_cancelled() {
                warn!(attempt, label = %self.label, "cancelled before retry");
                return Err(err);
            }

            let wait = self.policy.jittered(delay, &mut rand::thread_rng());
            warn!("{}", context.with_backoff(wait).format_retry());
            metrics::record_retry_backoff(wait, attempt);

            if !self.backoff(wait).await {
                warn!(attempt, label = %self.label, "backoff cancelled, giving up");
                return Err(err);
            }

            delay = self.policy.next_backoff(delay);
        }
    }
}
