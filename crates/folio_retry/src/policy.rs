//! Retry policy and the retry loop.

use folio_error::{FolioError, FolioResult, ProviderError, ProviderErrorKind, RetryableError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::{debug, warn};

/// Attempt, backoff and timeout limits for provider calls.
///
/// # Examples
///
/// ```
/// use folio_retry::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 3);
///
/// let quick = RetryPolicy::builder()
///     .initial_backoff_ms(1u64)
///     .attempt_timeout_ms(50u64)
///     .build()
///     .unwrap();
/// assert_eq!(quick.max_attempts(), 3);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(default)]
pub struct RetryPolicy {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    #[getter(copy)]
    max_attempts: usize,
    /// Delay before the second attempt; doubles afterwards
    #[serde(default = "default_initial_backoff_ms")]
    #[getter(copy)]
    initial_backoff_ms: u64,
    /// Cap on any single delay
    #[serde(default = "default_max_backoff_ms")]
    #[getter(copy)]
    max_backoff_ms: u64,
    /// Bound on a single attempt
    #[serde(default = "default_attempt_timeout_ms")]
    #[getter(copy)]
    attempt_timeout_ms: u64,
}

fn default_max_attempts() -> usize {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_attempt_timeout_ms() -> u64 {
    120_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

impl RetryPolicy {
    /// Creates a new policy builder.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Delays between attempts: `initial, 2*initial, 4*initial, ...` capped and jittered.
    fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        // Base 2 with a factor of initial/2 yields a doubling sequence starting at initial.
        ExponentialBackoff::from_millis(2)
            .factor((self.initial_backoff_ms / 2).max(1))
            .max_delay(Duration::from_millis(self.max_backoff_ms))
            .map(jitter)
            .take(self.max_attempts.saturating_sub(1))
    }
}

/// Run `call` under the policy.
///
/// Each attempt is bounded by `attempt_timeout_ms`; an elapsed attempt counts
/// as a `NetworkError`. Retryable failures are retried until the attempt
/// budget is spent, honouring a server-provided `retry_after`. Any other error
/// is returned from the attempt that produced it.
///
/// Dropping the returned future cancels the outstanding attempt.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> FolioResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FolioResult<T>>,
{
    let timeout = Duration::from_millis(policy.attempt_timeout_ms);
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0usize;

    Retry::spawn(policy.delays(), || {
        attempt += 1;
        let current = attempt;
        let pending = call();
        async move {
            let outcome = match tokio::time::timeout(timeout, pending).await {
                Ok(result) => result,
                Err(_) => Err(FolioError::from(ProviderError::new(
                    ProviderErrorKind::NetworkError(format!(
                        "{operation} timed out after {} ms",
                        timeout.as_millis()
                    )),
                ))),
            };
            match outcome {
                Ok(value) => {
                    if current > 1 {
                        debug!(operation, attempt = current, "Provider call succeeded after retry");
                    }
                    Ok(value)
                }
                Err(e) if e.is_retryable() && current < max_attempts => {
                    warn!(
                        operation,
                        attempt = current,
                        max_attempts,
                        error = %e,
                        "Transient provider failure, will retry"
                    );
                    let retry_after = e.retry_after();
                    Err(RetryError::Transient { err: e, retry_after })
                }
                Err(e) => {
                    warn!(operation, attempt = current, error = %e, "Provider call failed");
                    Err(RetryError::Permanent(e))
                }
            }
        }
    })
    .await
}
