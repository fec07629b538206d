//! OpenAI-compatible HTTP providers.

mod client;
mod dto;

pub use client::{OpenAiCompatibleClient, OpenAiEmbeddingClient, classify_response};
pub use dto::{ChatMessage, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse};
