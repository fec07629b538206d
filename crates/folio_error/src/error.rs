//! Top-level error wrapper types.

use crate::{
    ConfigError, ConsistencyError, MemoryError, PersistenceError, ProviderError,
    ProviderErrorKind, RetryableError, StageError, StageErrorKind, WorkspaceError,
    WorkspaceErrorKind,
};

/// Union of every domain error raised by folio crates.
///
/// # Examples
///
/// ```
/// use folio_error::{FolioError, WorkspaceError, WorkspaceErrorKind};
///
/// let busy = WorkspaceError::new(WorkspaceErrorKind::ProjectBusy("saga".into()));
/// let err: FolioError = busy.into();
/// assert!(format!("{}", err).contains("Workspace Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FolioErrorKind {
    /// Stage ordering or chapter lifecycle violation
    #[from(StageError)]
    Stage(StageError),
    /// Language-model or embedding provider failure
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Workspace or project lookup failure
    #[from(WorkspaceError)]
    Workspace(WorkspaceError),
    /// Consistency check could not run
    #[from(ConsistencyError)]
    Consistency(ConsistencyError),
    /// Storage write or read failure
    #[from(PersistenceError)]
    Persistence(PersistenceError),
    /// Vector memory failure
    #[from(MemoryError)]
    Memory(MemoryError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// folio error with kind discrimination.
///
/// # Examples
///
/// ```
/// use folio_error::{ConfigError, FolioResult};
///
/// fn might_fail() -> FolioResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert_eq!(err.code(), "config_error");
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("folio Error: {}", _0)]
pub struct FolioError(Box<FolioErrorKind>);

impl FolioError {
    /// Create a new error from a kind.
    pub fn new(kind: FolioErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FolioErrorKind {
        &self.0
    }

    /// Stable, machine-distinguishable code for this failure.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            FolioErrorKind::Stage(e) => match e.kind {
                StageErrorKind::InvalidStageTransition { .. } => "invalid_stage_transition",
                StageErrorKind::ChapterNotDrafted { .. } => "chapter_not_drafted",
                StageErrorKind::ChapterOutOfRange { .. } => "chapter_out_of_range",
                StageErrorKind::MissingArtifact(_) => "missing_artifact",
            },
            FolioErrorKind::Provider(e) => match e.kind {
                ProviderErrorKind::RateLimited { .. } => "rate_limited",
                ProviderErrorKind::AuthError(_) => "auth_error",
                ProviderErrorKind::MalformedResponse(_) => "malformed_response",
                ProviderErrorKind::NetworkError(_) => "network_error",
            },
            FolioErrorKind::Workspace(e) => match e.kind {
                WorkspaceErrorKind::ProjectBusy(_) => "project_busy",
                WorkspaceErrorKind::ProjectNotFound(_) => "project_not_found",
                WorkspaceErrorKind::InvalidProjectName(_) => "invalid_project_name",
                WorkspaceErrorKind::InvalidInput(_) => "invalid_input",
            },
            FolioErrorKind::Consistency(_) => "check_unavailable",
            FolioErrorKind::Persistence(_) => "persistence_error",
            FolioErrorKind::Memory(_) => "memory_error",
            FolioErrorKind::Config(_) => "config_error",
        }
    }

    /// The provider error, when this failure came from a capability call.
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self.kind() {
            FolioErrorKind::Provider(e) => Some(e),
            _ => None,
        }
    }
}

impl RetryableError for FolioError {
    fn is_retryable(&self) -> bool {
        self.as_provider().is_some_and(RetryableError::is_retryable)
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        self.as_provider().and_then(RetryableError::retry_after)
    }
}

// Generic From implementation for any type that converts to FolioErrorKind
impl<T> From<T> for FolioError
where
    T: Into<FolioErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for folio operations.
pub type FolioResult<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PersistenceErrorKind;

    #[test]
    fn test_codes_are_stable() {
        let err: FolioError = StageError::new(StageErrorKind::ChapterNotDrafted {
            chapter: 2,
            reason: "no draft".into(),
        })
        .into();
        assert_eq!(err.code(), "chapter_not_drafted");

        let err: FolioError =
            PersistenceError::new(PersistenceErrorKind::FileWrite("x".into())).into();
        assert_eq!(err.code(), "persistence_error");

        let err: FolioError = ConsistencyError::new("provider down").into();
        assert_eq!(err.code(), "check_unavailable");
    }

    #[test]
    fn test_retry_classification_passes_through() {
        let err: FolioError = ProviderError::new(ProviderErrorKind::RateLimited {
            message: "slow down".into(),
            retry_after_secs: Some(3),
        })
        .into();
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(3)));

        let err: FolioError =
            ProviderError::new(ProviderErrorKind::MalformedResponse("not json".into())).into();
        assert!(!err.is_retryable());

        let err: FolioError = WorkspaceError::new(WorkspaceErrorKind::ProjectBusy("p".into())).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_display_carries_location() {
        let err = StageError::new(StageErrorKind::MissingArtifact("blueprint".into()));
        let text = format!("{err}");
        assert!(text.contains("blueprint"));
        assert!(text.contains("error.rs"));
    }
}
