//! Retry logic with exponential backoff for transient remote errors.
//!
//! Throttling and network failures from the aws CLI are worth retrying;
//! everything else surfaces immediately. Delays go through the [`Clock`]
//! seam so tests run without waiting.

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::types::RetryConfig;

/// Callback trait for retry progress notifications.
pub trait RetryCallback {
    /// Called when an operation is being retried.
    ///
    /// # Arguments
    /// * `attempt` - Current attempt number (1-indexed)
    /// * `max_attempts` - Maximum number of attempts
    /// * `error` - The error that triggered the retry
    /// * `delay_secs` - Seconds until next attempt
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_secs: u64);
}

/// No-op callback that does nothing.
pub struct NoCallback;

impl RetryCallback for NoCallback {
    fn on_retry(&self, _attempt: u32, _max_attempts: u32, _error: &Error, _delay_secs: u64) {}
}

/// Callback that prints retry information to stderr.
pub struct PrintCallback;

impl RetryCallback for PrintCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_secs: u64) {
        eprintln!(
            "Attempt {}/{} failed: {}. Retrying in {}s...",
            attempt, max_attempts, error, delay_secs
        );
    }
}

/// Execute an operation with retry logic.
///
/// Retries the operation if it returns a retryable error, using
/// exponential backoff between attempts.
///
/// # Arguments
/// * `config` - Retry configuration
/// * `clock` - Delay source for the backoff sleeps
/// * `callback` - Optional callback for retry notifications
/// * `operation` - The operation to execute
///
/// # Returns
/// The result of the operation, or the last error if all attempts failed.
pub fn with_retry<T, F>(
    config: &RetryConfig,
    clock: &dyn Clock,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut last_error: Option<Error> = None;

    for attempt in 0..config.max_attempts {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                // If error is not retryable, return immediately
                if !e.is_retryable() {
                    return Err(e);
                }

                // If this was the last attempt, return the error
                if attempt + 1 >= config.max_attempts {
                    last_error = Some(e);
                    break;
                }

                // Calculate delay and notify callback
                let delay = config.delay_for_attempt(attempt);
                let delay_secs = delay.as_secs();

                if let Some(cb) = callback {
                    cb.on_retry(attempt + 1, config.max_attempts, &e, delay_secs);
                }

                // Wait before retry
                clock.sleep(delay);

                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::Other("retry exhausted".to_string())))
}
