//! Bounded retry with classified backoff.
//!
//! Every remote write goes through [`execute`]: a single combinator
//! parameterized by an error classifier, replacing per-call-site
//! catch-and-loop retry logic. Rate-limit errors back off exponentially
//! starting at two seconds; transient errors starting at one second;
//! fatal errors (permission, size rejection, missing resource) surface
//! immediately without consuming an attempt's backoff.
//!
//! Backoff schedules are built with `backon` and carry no jitter, so the
//! wait sequence for a given failure pattern is deterministic.

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};

/// Maximum attempts for a single remote write.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// First delay after a rate-limit failure (doubles per attempt).
pub const RATE_LIMIT_BASE_DELAY: Duration = Duration::from_secs(2);

/// First delay after a transient failure (doubles per attempt).
pub const TRANSIENT_BASE_DELAY: Duration = Duration::from_millis(1_000);

/// Ceiling for any single backoff wait.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// How the retry executor should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate limit / abuse detection: retry after exponential backoff.
    RateLimited,
    /// Unknown or network failure: retry after a shorter backoff.
    Transient,
    /// Permission, size, or missing-resource failure: never retry.
    Fatal,
}

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts in total, including the first.
    pub max_attempts: usize,
    /// First delay for the rate-limit schedule.
    pub rate_limit_base: Duration,
    /// First delay for the transient schedule.
    pub transient_base: Duration,
    /// Maximum delay for either schedule.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_WRITE_ATTEMPTS,
            rate_limit_base: RATE_LIMIT_BASE_DELAY,
            transient_base: TRANSIENT_BASE_DELAY,
            max_delay: MAX_BACKOFF,
        }
    }
}

impl RetryConfig {
    /// Create a configuration with a custom attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Backoff schedule for rate-limit failures: 2s, 4s, 8s, ...
    fn rate_limit_backoff(&self) -> impl Iterator<Item = Duration> {
        ExponentialBuilder::default()
            .with_min_delay(self.rate_limit_base)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_max_times(self.max_attempts)
            .build()
    }

    /// Backoff schedule for transient failures: 1s, 2s, 4s, ...
    fn transient_backoff(&self) -> impl Iterator<Item = Duration> {
        ExponentialBuilder::default()
            .with_min_delay(self.transient_base)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_max_times(self.max_attempts)
            .build()
    }
}

/// Execute an operation with bounded, classified retry.
///
/// Issues at most `config.max_attempts` attempts. On failure the error is
/// classified: fatal errors return immediately, the others sleep on their
/// schedule and try again. When attempts are exhausted the last observed
/// error is returned exactly once.
///
/// `on_retry` is invoked before each sleep with the error, the chosen
/// delay, and the 1-based attempt number that just failed; call sites
/// wire it to progress reporting.
///
/// # Example
///
/// ```ignore
/// use gitferry::retry::{execute, RetryConfig};
///
/// let result = execute(
///     || async { remote.create_blob(&content, encoding).await },
///     |e| e.retry_class(),
///     &RetryConfig::default(),
///     |e, delay, attempt| tracing::debug!("retrying after {delay:?} (attempt {attempt}): {e}"),
/// )
/// .await?;
/// ```
pub async fn execute<T, E, F, Fut, C, N>(
    mut operation: F,
    classify: C,
    config: &RetryConfig,
    mut on_retry: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error,
    C: Fn(&E) -> ErrorClass,
    N: FnMut(&E, Duration, usize),
{
    let mut rate_limit_delays = config.rate_limit_backoff();
    let mut transient_delays = config.transient_backoff();
    let mut attempt = 0usize;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= config.max_attempts {
            return Err(err);
        }

        let delay = match classify(&err) {
            ErrorClass::Fatal => return Err(err),
            ErrorClass::RateLimited => rate_limit_delays.next(),
            ErrorClass::Transient => transient_delays.next(),
        };

        // The schedules are sized to max_attempts, so running dry means
        // the attempt budget is spent either way.
        let Some(delay) = delay else {
            return Err(err);
        };

        on_retry(&err, delay, attempt);
        tokio::time::sleep(delay).await;
    }
}

/// [`execute`] with retry notifications routed to debug logging.
pub async fn execute_logged<T, E, F, Fut, C>(
    operation: F,
    classify: C,
    config: &RetryConfig,
    label: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error,
    C: Fn(&E) -> ErrorClass,
{
    execute(operation, classify, config, |err, delay, attempt| {
        tracing::debug!(
            "{} failed (attempt {}), retrying in {:?}: {}",
            label,
            attempt,
            delay,
            err
        );
    })
    .await
}
