//! Vector memory errors.

/// Vector memory error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum MemoryErrorKind {
    /// Embedding length differs from the index dimension
    #[display("Embedding dimension mismatch: expected {}, got {}", expected, actual)]
    DimensionMismatch {
        /// Dimension fixed by the first record
        expected: usize,
        /// Dimension of the offending vector
        actual: usize,
    },
    /// Provider returned a zero-length embedding
    #[display("Embedding provider returned an empty vector")]
    EmptyEmbedding,
}

/// Memory error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Memory Error: {} at line {} in {}", kind, line, file)]
pub struct MemoryError {
    /// The kind of error that occurred
    pub kind: MemoryErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl MemoryError {
    /// Create a new MemoryError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: MemoryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
