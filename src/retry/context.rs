//! Retry log message formatting.
//!
//! Keeps retry/failure messages consistent across call sites:
//! `Retrying (attempt 1/3) after <error> - waiting 0.5 seconds... (USD->JPY)`.

use std::time::Duration;

/// Context for one failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryContext {
    /// Attempt that just failed (1-based)
    pub attempt: u32,
    /// Maximum attempts configured
    pub max_attempts: u32,
    /// Label of the operation (e.g., "USD->JPY"), may be empty
    pub label: String,
    /// Error message of the failed attempt
    pub error_message: String,
    /// Wait before the next attempt, if one is scheduled
    pub backoff: Option<Duration>,
}

impl RetryContext {
    /// Create a context without a scheduled backoff.
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        label: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            label: label.into(),
            error_message: error_message.into(),
            backoff: None,
        }
    }

    /// Attach the wait before the next attempt.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Message logged before sleeping.
    pub fn format_retry(&self) -> String {
        let wait = self.backoff.unwrap_or_default().as_secs_f64();
        let mut message = format!(
            "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds...",
            self.attempt, self.max_attempts, self.error_message, wait
        );
        self.append_label(&mut message);
        message
    }

    /// Message logged when giving up.
    pub fn format_failure(&self) -> String {
        let mut message = format!(
            "[FAILED] giving up after {} attempts: {}",
            self.attempt, self.error_message
        );
        self.append_label(&mut message);
        message
    }

    fn append_label(&self, buffer: &mut String) {
        if !self.label.is_empty() {
            buffer.push_str(" (");
            buffer.push_str(&self.label);
            buffer.push(')');
        }
    }
}
