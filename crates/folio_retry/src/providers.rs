//! Provider decorators applying a [`RetryPolicy`].

use crate::{RetryPolicy, with_retry};
use async_trait::async_trait;
use folio_core::GenerationConfig;
use folio_error::FolioResult;
use folio_interface::{EmbeddingProvider, LlmProvider};
use std::sync::Arc;
use tracing::instrument;

/// Language model wrapped with timeout and retry.
#[derive(Clone)]
pub struct ResilientLlm {
    inner: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
}

impl ResilientLlm {
    /// Wrap a provider.
    pub fn new(inner: Arc<dyn LlmProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LlmProvider for ResilientLlm {
    #[instrument(
        name = "llm_complete",
        skip(self, prompt, config),
        fields(
            provider = self.inner.provider_name(),
            label = %config.label,
            prompt_chars = prompt.len()
        )
    )]
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> FolioResult<String> {
        with_retry(&self.policy, &config.label, || self.inner.complete(prompt, config)).await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Embedding provider wrapped with timeout and retry.
#[derive(Clone)]
pub struct ResilientEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    policy: RetryPolicy,
}

impl ResilientEmbedder {
    /// Wrap a provider.
    pub fn new(inner: Arc<dyn EmbeddingProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl EmbeddingProvider for ResilientEmbedder {
    #[instrument(
        name = "embed",
        skip(self, text),
        fields(provider = self.inner.provider_name(), text_chars = text.len())
    )]
    async fn embed(&self, text: &str) -> FolioResult<Vec<f32>> {
        with_retry(&self.policy, "embed", || self.inner.embed(text)).await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
