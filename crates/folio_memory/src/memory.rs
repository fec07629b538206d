//! Vector memory bound to an embedding provider.

use crate::{VectorIndex, chunk_text};
use folio_core::{RecordSource, ScoredRecord, VectorRecord};
use folio_error::FolioResult;
use folio_interface::EmbeddingProvider;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Semantic index for one project.
///
/// Queries take a shared lock and may run concurrently. Mutations take the
/// exclusive lock once, so a reader observes either the state before a
/// replacement or the state after it. Embedding calls are made before any
/// lock is taken.
pub struct VectorMemory {
    index: RwLock<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for VectorMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorMemory")
            .field("embedder", &self.embedder.provider_name())
            .finish_non_exhaustive()
    }
}

impl VectorMemory {
    /// Create an empty memory.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_index(embedder, VectorIndex::default())
    }

    /// Create a memory over existing records.
    pub fn with_index(embedder: Arc<dyn EmbeddingProvider>, index: VectorIndex) -> Self {
        Self {
            index: RwLock::new(index),
            embedder,
        }
    }

    /// Embed one text.
    pub async fn embed(&self, text: &str) -> FolioResult<Vec<f32>> {
        self.embedder.embed(text).await
    }

    /// Chunk `text` and embed each chunk in order.
    #[instrument(skip(self, text), fields(text_chars = text.len()))]
    pub async fn embed_chunks(
        &self,
        text: &str,
        chunk_chars: usize,
    ) -> FolioResult<Vec<(String, Vec<f32>)>> {
        let mut embedded = Vec::new();
        for chunk in chunk_text(text, chunk_chars) {
            let vector = self.embedder.embed(&chunk).await?;
            embedded.push((chunk, vector));
        }
        debug!(chunks = embedded.len(), "Embedded text chunks");
        Ok(embedded)
    }

    /// Embed and append a single record, returning its insertion id.
    pub async fn insert(&self, source: RecordSource, chunk: u32, text: &str) -> FolioResult<u64> {
        let vector = self.embedder.embed(text).await?;
        self.index.write().await.insert(source, chunk, text, vector)
    }

    /// Remove every record from `source`.
    pub async fn remove_by_source(&self, source: &RecordSource) -> usize {
        self.index.write().await.remove_by_source(source)
    }

    /// Top `k` records by descending similarity to `text`.
    ///
    /// An empty index yields an empty result without calling the embedder.
    pub async fn query(&self, text: &str, k: usize) -> FolioResult<Vec<ScoredRecord>> {
        self.query_filtered(text, k, |_| true).await
    }

    /// Like [`VectorMemory::query`], considering only records passing `filter`.
    #[instrument(skip(self, text, filter))]
    pub async fn query_filtered(
        &self,
        text: &str,
        k: usize,
        filter: impl Fn(&VectorRecord) -> bool + Send,
    ) -> FolioResult<Vec<ScoredRecord>> {
        if k == 0 || self.index.read().await.is_empty() {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(text).await?;
        let hits = self.index.read().await.rank(&vector, k, filter)?;
        debug!(hits = hits.len(), "Vector memory query");
        Ok(hits)
    }

    /// Copy of the current index, for staging a mutation.
    pub async fn snapshot(&self) -> VectorIndex {
        self.index.read().await.clone()
    }

    /// Replace the whole index in one step.
    pub async fn install(&self, index: VectorIndex) {
        *self.index.write().await = index;
    }

    /// Current records in insertion order.
    pub async fn records(&self) -> Vec<VectorRecord> {
        self.index.read().await.records().to_vec()
    }

    /// Number of live records.
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    /// Whether the memory holds no records.
    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    /// Number of live records from one source.
    pub async fn count_source(&self, source: &RecordSource) -> usize {
        self.index.read().await.count_source(source)
    }
}
