//! In-memory vector index with deterministic ranking.

use folio_core::{RecordSource, ScoredRecord, VectorRecord};
use folio_error::{FolioResult, MemoryError, MemoryErrorKind};

/// Cosine similarity of two vectors.
///
/// Returns `None` when lengths differ, either vector is empty, or either norm
/// is zero.
///
/// # Examples
///
/// ```
/// use folio_memory::cosine_similarity;
///
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]), Some(1.0));
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]), Some(0.0));
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
/// assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some(dot / denom)
}

/// Records in insertion order with a fixed embedding dimension.
///
/// The dimension is fixed by the first record inserted and cleared when the
/// index becomes empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    records: Vec<VectorRecord>,
    next_id: u64,
}

impl VectorIndex {
    /// Rebuild an index from persisted records.
    pub fn from_records(mut records: Vec<VectorRecord>) -> Self {
        records.sort_by_key(|record| record.id);
        let next_id = records.last().map(|record| record.id + 1).unwrap_or(0);
        Self { records, next_id }
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[VectorRecord] {
        &self.records
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding dimension, once known.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(|record| record.embedding.len())
    }

    /// Number of live records from one source.
    pub fn count_source(&self, source: &RecordSource) -> usize {
        self.records.iter().filter(|record| &record.source == source).count()
    }

    fn check_dimension(&self, embedding: &[f32]) -> FolioResult<()> {
        if embedding.is_empty() {
            return Err(MemoryError::new(MemoryErrorKind::EmptyEmbedding).into());
        }
        match self.dimension() {
            Some(expected) if expected != embedding.len() => {
                Err(MemoryError::new(MemoryErrorKind::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                })
                .into())
            }
            _ => Ok(()),
        }
    }

    /// Append a record, returning its insertion id.
    ///
    /// # Errors
    ///
    /// `EmptyEmbedding` or `DimensionMismatch` when the vector does not fit the index.
    pub fn insert(
        &mut self,
        source: RecordSource,
        chunk: u32,
        text: impl Into<String>,
        embedding: Vec<f32>,
    ) -> FolioResult<u64> {
        self.check_dimension(&embedding)?;
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(VectorRecord {
            id,
            source,
            chunk,
            text: text.into(),
            embedding,
        });
        Ok(id)
    }

    /// Remove every record from `source`, returning how many were removed.
    pub fn remove_by_source(&mut self, source: &RecordSource) -> usize {
        let before = self.records.len();
        self.records.retain(|record| &record.source != source);
        before - self.records.len()
    }

    /// Replace all records of `source` with `chunks`, returning `(removed, inserted)`.
    ///
    /// Every embedding is validated before anything is removed, so a failure
    /// leaves the index untouched.
    pub fn replace_source(
        &mut self,
        source: &RecordSource,
        chunks: Vec<(String, Vec<f32>)>,
    ) -> FolioResult<(usize, usize)> {
        let mut staged = self.clone();
        let removed = staged.remove_by_source(source);
        let inserted = chunks.len();
        for (position, (text, embedding)) in chunks.into_iter().enumerate() {
            staged.insert(source.clone(), position as u32, text, embedding)?;
        }
        *self = staged;
        Ok((removed, inserted))
    }

    /// Remove every record. Insertion ids keep increasing.
    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        removed
    }

    /// Top `k` records passing `filter`, by descending similarity to `query`.
    ///
    /// Ties go to the earlier insertion. Records with a zero vector score 0.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `query` does not match the index dimension.
    pub fn rank(
        &self,
        query: &[f32],
        k: usize,
        filter: impl Fn(&VectorRecord) -> bool,
    ) -> FolioResult<Vec<ScoredRecord>> {
        if k == 0 || self.records.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimension(query)?;

        let mut hits: Vec<ScoredRecord> = self
            .records
            .iter()
            .filter(|record| filter(record))
            .map(|record| ScoredRecord {
                score: cosine_similarity(query, &record.embedding).unwrap_or(0.0),
                record: record.clone(),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}
