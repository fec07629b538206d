//! Deterministic feature-hashing embedder.

use async_trait::async_trait;
use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use folio_interface::EmbeddingProvider;
use sha2::{Digest, Sha256};
use tracing::instrument;

/// Default vector width.
pub const DEFAULT_DIMENSIONS: usize = 256;

/// Offline embedder that hashes tokens into a fixed-width, L2-normalised vector.
///
/// Identical text always yields the identical vector, so retrieval against
/// it is reproducible across runs and machines. Texts sharing vocabulary
/// score higher under cosine similarity than unrelated texts.
///
/// # Examples
///
/// ```
/// use folio_models::HashingEmbedder;
///
/// let embedder = HashingEmbedder::new(64);
/// let keeper = embedder.vectorize("The lighthouse keeper climbs the stairs");
/// assert_eq!(keeper.len(), 64);
/// assert_eq!(keeper, embedder.vectorize("The lighthouse keeper climbs the stairs"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimensions` components (at least 1).
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Vector width.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed synchronously.
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let index = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

/// Lowercased alphanumeric words; CJK ideographs and kana count as one token each.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if is_cjk(c) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(c.to_string());
        } else if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0xAC00..=0xD7AF)
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    #[instrument(skip(self, text), fields(dimensions = self.dimensions, text_chars = text.len()))]
    async fn embed(&self, text: &str) -> FolioResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::MalformedResponse(
                "cannot embed empty text".to_string(),
            ))
            .into());
        }
        Ok(self.vectorize(text))
    }

    fn provider_name(&self) -> &'static str {
        "hashing"
    }

    fn model_name(&self) -> &str {
        "feature-hashing"
    }
}
