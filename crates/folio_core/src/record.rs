//! Vector memory records.

use serde::{Deserialize, Serialize};

/// What a vector record was derived from.
///
/// # Examples
///
/// ```
/// use folio_core::RecordSource;
///
/// assert_eq!(format!("{}", RecordSource::Chapter(3)), "chapter 3");
/// assert_eq!(format!("{}", RecordSource::Reference("atlas".into())), "reference atlas");
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
pub enum RecordSource {
    /// The architecture document
    #[display("architecture")]
    Architecture,
    /// Finalized text of a chapter
    #[display("chapter {}", _0)]
    Chapter(u32),
    /// An imported reference document
    #[display("reference {}", _0)]
    Reference(String),
}

/// An embedded chunk of text. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Insertion sequence number, unique within a project
    pub id: u64,
    /// Origin of the chunk
    pub source: RecordSource,
    /// Position of the chunk within its source
    pub chunk: u32,
    /// Chunk text
    pub text: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// A record paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Matched record
    pub record: VectorRecord,
    /// Cosine similarity to the query
    pub score: f64,
}
