//! Consistency check error types.

/// The consistency check could not be performed.
///
/// Distinct from a report with no findings: callers must never read this as
/// "no contradictions".
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Consistency check unavailable: {} at line {} in {}", message, line, file)]
pub struct ConsistencyError {
    /// Why the check could not run
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConsistencyError {
    /// Create a new ConsistencyError at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
