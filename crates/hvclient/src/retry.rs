//! Retry logic with exponential backoff for retryable errors.
//!
//! Nothing in this crate calls these helpers on its own; they exist for
//! callers that decide an operation is safe to repeat.

use crate::error::{Error, Result};
use crate::types::RetryConfig;
use std::thread;

/// Callback trait for retry progress notifications.
pub trait RetryCallback {
    /// Called before an operation is retried.
    ///
    /// # Arguments
    /// * `attempt` - Attempt that just failed (1-indexed)
    /// * `max_attempts` - Maximum number of attempts
    /// * `error` - The error that triggered the retry
    /// * `delay_secs` - Seconds until next attempt
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_secs: u64);
}

/// Callback that logs each retry as a warning.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_secs: u64) {
        log::warn!(
            "Attempt {}/{} failed: {}. Retrying in {}s...",
            attempt,
            max_attempts,
            error,
            delay_secs
        );
    }
}

/// Execute an operation, retrying retryable errors with exponential backoff.
///
/// `classify` maps the operation's error to the client error that decides
/// retryability, so callers can wrap [`Error`] in their own types.
///
/// # Returns
/// The result of the operation, or the last error if all attempts failed.
pub fn with_retry<T, E, F, C>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    classify: C,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> std::result::Result<T, E>,
    C: Fn(&E) -> Option<&Error>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let err = match operation() {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let retryable = classify(&err).is_some_and(Error::is_retryable);
        if !retryable || attempt + 1 >= max_attempts {
            return Err(err);
        }

        let delay = config.delay_for_attempt(attempt);
        if let (Some(cb), Some(client_err)) = (callback, classify(&err)) {
            cb.on_retry(attempt + 1, max_attempts, client_err, delay.as_secs());
        }

        thread::sleep(delay);
        attempt += 1;
    }
}

/// Retry an operation returning client errors directly.
pub fn with_retry_simple<T, F>(config: &RetryConfig, operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    with_retry(config, Some(&LogCallback), |e| Some(e), operation)
}
