//! Language-model and embedding providers.
//!
//! - [`OpenAiCompatibleClient`] speaks the `/chat/completions` protocol
//!   shared by OpenAI and most hosted or local gateways.
//! - [`OpenAiEmbeddingClient`] speaks `/embeddings`.
//! - [`HashingEmbedder`] is a deterministic, offline feature-hashing
//!   embedder for reproducible retrieval.
//!
//! [`build_llm`] and [`build_embedder`] resolve configuration into trait
//! objects once, at the application boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod hashing;
mod openai;
mod selection;

pub use hashing::HashingEmbedder;
pub use openai::{
    ChatMessage, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
    OpenAiCompatibleClient, OpenAiEmbeddingClient, classify_response,
};
pub use selection::{
    EmbeddingProviderKind, EmbeddingSettings, LlmProviderKind, LlmSettings, build_embedder,
    build_llm,
};
