//! Retry strategy for catalog fetches and asset downloads
//!
//! The default [`RetryConfig`] retries forever with no delay: a failing
//! operation is simply run again until it succeeds. Bounds, delays,
//! exponential backoff and jitter can be switched on through configuration.
//!
//! # Example
//!
//! ```no_run
//! use catalog_dl::retry::{IsRetryable, with_retry};
//! use catalog_dl::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig {
//!     max_retries: Some(3),
//!     retry_all_errors: false,
//!     ..RetryConfig::default()
//! };
//! with_retry(&config, || async {
//!     // Your operation here
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{DownloadError, Error, FetchError, ProbeError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Only consulted when [`RetryConfig::retry_all_errors`] is false.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

fn is_transient_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

fn is_transient_reqwest(e: &reqwest::Error) -> bool {
    if let Some(status) = e.status() {
        return is_transient_status(status.as_u16());
    }
    e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
}

fn is_transient_io(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
    )
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::BadStatus { status, .. } => is_transient_status(*status),
            // The same page will decode the same way next time
            FetchError::Malformed { .. } => false,
            FetchError::Transport(e) => is_transient_reqwest(e),
        }
    }
}

impl IsRetryable for ProbeError {
    fn is_retryable(&self) -> bool {
        match self {
            ProbeError::Transport(e) => is_transient_reqwest(e),
            ProbeError::BadStatus { status, .. } => is_transient_status(*status),
            ProbeError::MissingHeader { .. } => false,
        }
    }
}

impl IsRetryable for DownloadError {
    fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Transport(e) => is_transient_reqwest(e),
            DownloadError::BadStatus { status, .. } => is_transient_status(*status),
            DownloadError::Io { source, .. } => is_transient_io(source),
        }
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Fetch(e) => e.is_retryable(),
            Error::Probe(e) => e.is_retryable(),
            Error::Download(e) => e.is_retryable(),
            Error::Io(e) => is_transient_io(e),
            Error::Network(e) => is_transient_reqwest(e),
            Error::Config { .. } => false,
            Error::Serialization(_) => false,
            Error::TaskFailed(_) => false,
        }
    }
}

/// Run `operation` until it succeeds, with no delay and no attempt limit
///
/// Equivalent to [`with_retry`] with [`RetryConfig::default()`], for error
/// types that do not implement [`IsRetryable`]. An operation that fails `k`
/// times and then succeeds is invoked exactly `k + 1` times. A permanently
/// failing operation never returns.
pub async fn retry_forever<F, Fut, T, E>(mut operation: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let config = RetryConfig::default();
    loop {
        let outcome = with_retry(&config, || {
            let attempt = operation();
            async move { attempt.await.map_err(AlwaysRetry) }
        })
        .await;
        // The default policy is unbounded, so Err never comes back
        if let Ok(result) = outcome {
            return result;
        }
    }
}

/// Error adapter that every policy treats as retryable
struct AlwaysRetry<E>(E);

impl<E: std::fmt::Display> std::fmt::Display for AlwaysRetry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<E> IsRetryable for AlwaysRetry<E> {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Execute an async operation under the given retry strategy
///
/// # Arguments
///
/// * `config` - Retry strategy (bound, delays, backoff multiplier, jitter, error filter)
/// * `operation` - Async closure that returns `Result<T, E>`
///
/// # Returns
///
/// The successful result, or the last error once the strategy gives up. With
/// the default configuration this only ever returns `Ok`.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt: u32 = 0;
    let mut delay = config.initial_delay.min(config.max_delay);

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if should_retry(config, &e, attempt) => {
                attempt = attempt.saturating_add(1);

                tracing::debug!(
                    error = %e,
                    attempt,
                    max_retries = ?config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );

                if !delay.is_zero() {
                    let wait = if config.jitter {
                        add_jitter(delay, config.max_delay)
                    } else {
                        delay
                    };
                    tokio::time::sleep(wait).await;

                    // Overflow or NaN saturates at the cap
                    delay = Duration::try_from_secs_f64(
                        delay.as_secs_f64() * config.backoff_multiplier,
                    )
                    .unwrap_or(config.max_delay)
                    .min(config.max_delay);
                }
            }
            Err(e) => {
                if e.is_retryable() || config.retry_all_errors {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "Operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

fn should_retry<E: IsRetryable>(config: &RetryConfig, error: &E, attempt: u32) -> bool {
    let within_budget = config.max_retries.is_none_or(|max| attempt < max);
    within_budget && (config.retry_all_errors || error.is_retryable())
}

/// Add random jitter to a delay
///
/// The result is uniformly distributed between `delay` and `2 * delay`, or
/// `fallback` when that is not representable as a `Duration`.
fn add_jitter(delay: Duration, fallback: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor)).unwrap_or(fallback)
}
