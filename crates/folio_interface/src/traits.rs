//! Provider capability traits.

use async_trait::async_trait;
use folio_core::GenerationConfig;
use folio_error::FolioResult;

/// Text completion capability.
///
/// Implementations report failures as `ProviderError` with one of
/// `RateLimited`, `AuthError`, `MalformedResponse` or `NetworkError`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt.
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> FolioResult<String>;

    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Embedding capability producing fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text.
    async fn embed(&self, text: &str) -> FolioResult<Vec<f32>>;

    /// Provider name (e.g., "openai", "hashing").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}
