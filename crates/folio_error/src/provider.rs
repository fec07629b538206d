//! Language-model and embedding provider errors with retry classification.

use std::time::Duration;

/// Failure taxonomy shared by every provider capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Provider throttled the request
    #[display("Rate limited: {}", message)]
    RateLimited {
        /// Provider message
        message: String,
        /// Server-suggested wait before retrying, in seconds
        retry_after_secs: Option<u64>,
    },
    /// Credentials were rejected
    #[display("Authentication failed: {}", _0)]
    AuthError(String),
    /// Response could not be interpreted
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),
    /// Transport failure or timeout
    #[display("Network error: {}", _0)]
    NetworkError(String),
}

impl ProviderErrorKind {
    /// Rate limits and network failures are transient; the rest are fatal to the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited { .. } | ProviderErrorKind::NetworkError(_)
        )
    }

    /// Map an HTTP status to a provider error kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_error::ProviderErrorKind;
    ///
    /// assert!(matches!(
    ///     ProviderErrorKind::from_status(401, "bad key"),
    ///     ProviderErrorKind::AuthError(_)
    /// ));
    /// assert!(ProviderErrorKind::from_status(503, "overloaded").is_retryable());
    /// ```
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => ProviderErrorKind::AuthError(message),
            429 => ProviderErrorKind::RateLimited {
                message,
                retry_after_secs: None,
            },
            408 | 500..=599 => ProviderErrorKind::NetworkError(format!("HTTP {status}: {message}")),
            _ => ProviderErrorKind::MalformedResponse(format!("HTTP {status}: {message}")),
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use folio_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::new(ProviderErrorKind::NetworkError("connection reset".into()));
/// assert!(err.is_retryable());
///
/// let err = ProviderError::new(ProviderErrorKind::AuthError("invalid key".into()));
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// Lets an error say whether the request that produced it may be repeated
/// and whether the server asked for a specific wait.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;

    /// Server-provided delay to honour before the next attempt, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_after(&self) -> Option<Duration> {
        match &self.kind {
            ProviderErrorKind::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}
