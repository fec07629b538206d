//! Workspace and project lookup errors.

/// Workspace-level error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum WorkspaceErrorKind {
    /// Another mutation is in flight for the project
    #[display("Project '{}' is busy with another operation", _0)]
    ProjectBusy(String),
    /// No project with that name exists
    #[display("Project not found: {}", _0)]
    ProjectNotFound(String),
    /// Project name is not a single path segment
    #[display("Invalid project name: {}", _0)]
    InvalidProjectName(String),
    /// Request arguments failed validation
    #[display("Invalid input: {}", _0)]
    InvalidInput(String),
}

/// Workspace error with source location tracking.
///
/// # Examples
///
/// ```
/// use folio_error::{WorkspaceError, WorkspaceErrorKind};
///
/// let err = WorkspaceError::new(WorkspaceErrorKind::ProjectBusy("saga".to_string()));
/// assert!(format!("{}", err).contains("busy"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Workspace Error: {} at line {} in {}", kind, line, file)]
pub struct WorkspaceError {
    /// The kind of error that occurred
    pub kind: WorkspaceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl WorkspaceError {
    /// Create a new WorkspaceError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: WorkspaceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
