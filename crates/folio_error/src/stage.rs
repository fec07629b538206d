//! Stage ordering and chapter lifecycle errors.

/// Caller errors raised by the stage state machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StageErrorKind {
    /// Operation requested while the project is in the wrong stage
    #[display("{} requires stage {} but project is {}", operation, required, actual)]
    InvalidStageTransition {
        /// Operation that was attempted
        operation: String,
        /// Stage(s) the operation accepts
        required: String,
        /// Stage the project is currently in
        actual: String,
    },
    /// Finalization requested for a chapter without a usable draft
    #[display("Chapter {} is not drafted: {}", chapter, reason)]
    ChapterNotDrafted {
        /// Chapter index
        chapter: u32,
        /// Why the chapter cannot be finalized
        reason: String,
    },
    /// Chapter index outside the blueprint range
    #[display("Chapter {} is outside the blueprint range 1..={}", chapter, max)]
    ChapterOutOfRange {
        /// Requested chapter index
        chapter: u32,
        /// Highest valid index
        max: u32,
    },
    /// An artifact the operation depends on is absent
    #[display("Missing artifact: {}", _0)]
    MissingArtifact(String),
}

/// Stage error with source location tracking.
///
/// # Examples
///
/// ```
/// use folio_error::{StageError, StageErrorKind};
///
/// let err = StageError::new(StageErrorKind::ChapterOutOfRange { chapter: 7, max: 3 });
/// assert!(format!("{}", err).contains("1..=3"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Stage Error: {} at line {} in {}", kind, line, file)]
pub struct StageError {
    /// The kind of error that occurred
    pub kind: StageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StageError {
    /// Create a new StageError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
