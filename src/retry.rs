//! Retry logic for listing page fetches
//!
//! Pages must be processed in order, so a failing page is retried in place
//! rather than skipped. [`RetryPolicy`] decides how many attempts are made
//! and how long to wait between them; the defaults wait a fixed five seconds
//! between five attempts because failures are assumed to be transient rate
//! limiting.
//!
//! # Example
//!
//! ```no_run
//! use kb_export::retry::{RetryPolicy, fetch_with_retry};
//! use kb_export::config::RetryConfig;
//! use kb_export::Error;
//!
//! # async fn example() -> Result<(), Error> {
//! let policy = RetryPolicy::from(&RetryConfig::default());
//! let value = fetch_with_retry(&policy, "page 1", || async {
//!     Ok::<_, Error>(42)
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Gateway failures are all treated as transient: the listing
            // endpoint fails under rate limiting with a mix of statuses,
            // truncated bodies and dropped connections.
            Error::Transport(_) | Error::HttpStatus { .. } | Error::Decode { .. } => true,
            // Local problems will not fix themselves between attempts
            Error::Config { .. } | Error::Filesystem { .. } | Error::Serialization(_) => false,
            // Already-wrapped errors have been through their own handling
            Error::RetryExhausted { .. }
            | Error::Page { .. }
            | Error::Enrichment { .. }
            | Error::Write { .. }
            | Error::AssetDownload { .. } => false,
        }
    }
}

/// How many attempts to make and how long to wait between them
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Wait after the first failure
    pub initial_delay: Duration,
    /// Upper bound for any wait
    pub max_delay: Duration,
    /// Growth factor between waits (1.0 keeps the wait fixed)
    pub backoff_multiplier: f64,
    /// Stretch each wait by a random 0-100%
    pub jitter: bool,
}

impl RetryPolicy {
    /// Policy that retries `max_attempts` times without waiting (for tests)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Wait before the attempt following failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let delay = Duration::from_secs_f64(secs).min(self.max_delay.max(self.initial_delay));
        if self.jitter { add_jitter(delay) } else { delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: config.initial_delay,
            max_delay: config.max_delay,
            backoff_multiplier: config.backoff_multiplier,
            jitter: config.jitter,
        }
    }
}

/// Run `operation` until it succeeds or the policy's attempts are used up
///
/// Non-retryable errors are returned unchanged after the first attempt.
/// When every attempt fails, the errors of all attempts are joined into
/// [`Error::RetryExhausted`].
///
/// # Arguments
///
/// * `policy` - Attempt bound and delays
/// * `label` - Short description of the operation for log lines
/// * `operation` - Async closure producing one attempt
pub async fn fetch_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut errors = Vec::new();

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(label, attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !e.is_retryable() => {
                tracing::error!(label, error = %e, "Operation failed with non-retryable error");
                return Err(e);
            }
            Err(e) => {
                if attempt < max_attempts {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        label,
                        error = %e,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Operation failed, retrying"
                    );
                    println!("retry {label}");
                    errors.push(e);
                    tokio::time::sleep(delay).await;
                } else {
                    errors.push(e);
                }
            }
        }
    }

    tracing::error!(
        label,
        attempts = max_attempts,
        "Operation failed after all retry attempts exhausted"
    );
    Err(Error::RetryExhausted {
        attempts: max_attempts,
        errors,
    })
}

/// Add random jitter to a delay
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
