//! Backoff policy and predicates for retrying failed attempts.
//!
//! The retry interceptor consults a [`RetryPredicate`] to decide whether a
//! failure is worth another attempt, and a [`RetryPolicy`] to decide how long
//! to wait before it.

use crate::Error;
use std::time::Duration;

/// Exponential backoff: the first retry waits `initial`, each later one waits
/// `multiplier` times longer, never more than `max`.
///
/// # Examples
///
/// ```
/// use rest_chain::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy {
///     initial: Duration::from_millis(100),
///     multiplier: 2.0,
///     max: Duration::from_millis(300),
///     max_retries: Some(3),
/// };
///
/// assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(100)));
/// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(200)));
/// assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_millis(300)));
/// assert_eq!(policy.delay_for_attempt(4), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// The delay before the first retry.
    pub initial: Duration,
    /// Growth factor applied after every failure.
    pub multiplier: f64,
    /// The maximum delay between retries.
    pub max: Duration,
    /// The maximum number of retries, or `None` to retry until success.
    pub max_retries: Option<usize>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            multiplier: 2.0,
            max: Duration::from_millis(3_600_000),
            max_retries: None,
        }
    }
}

impl RetryPolicy {
    /// Returns the delay before the given retry, or `None` if retries are exhausted.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The retry number (1-indexed, so 1 = first retry)
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        if let Some(max_retries) = self.max_retries {
            if attempt > max_retries {
                return None;
            }
        }

        // initial * multiplier^(attempt - 1), capped at max
        let exponent = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
        let secs = self.initial.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(self.max);
        Some(delay.min(self.max))
    }
}

/// Decides whether a failed attempt should be retried.
///
/// # Examples
///
/// ```
/// use rest_chain::{Error, RetryPredicate};
///
/// struct RetryOnRateLimit;
///
/// impl RetryPredicate for RetryOnRateLimit {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         error.status().is_some_and(|s| s.as_u16() == 429)
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if the attempt that produced `error` should be retried.
    ///
    /// # Arguments
    ///
    /// * `error` - The error that occurred
    /// * `attempt` - The attempt number (1-indexed)
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry all errors that are marked as retryable. The default.
///
/// Uses [`Error::is_retryable`]: network errors, timeouts, 5xx and 429.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}

/// Retry only failures where no response was received: network errors and
/// timeouts.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnConnectionError;

impl RetryPredicate for RetryOnConnectionError {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Network(_) | Error::Timeout { .. })
    }
}

/// Retries if ANY of the predicates return `true`.
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self.predicates
            .iter()
            .any(|p| p.should_retry(error, attempt))
    }
}
