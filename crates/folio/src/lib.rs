//! Folio - staged, retrieval-grounded long-form fiction generation.
//!
//! A project moves through a fixed sequence of stages: architecture,
//! chapter blueprint, then per-chapter outline, draft and finalization.
//! Finalized chapters feed a per-project vector memory, a running summary,
//! character state and plot threads, which ground every later prompt.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use folio::{ChapterDirectives, FolioConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FolioConfig::load()?;
//!     let workspace = config.build_workspace()?;
//!
//!     workspace
//!         .create_or_load_project("the-long-dark", config.defaults().clone())
//!         .await?;
//!     workspace.generate_architecture("the-long-dark", None).await?;
//!     workspace.generate_blueprint("the-long-dark", None).await?;
//!     let chapter = workspace
//!         .generate_chapter_draft("the-long-dark", 1, &ChapterDirectives::default())
//!         .await?;
//!     println!("{}", chapter.draft);
//!     workspace.finalize_chapter("the-long-dark", 1, None).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod telemetry;

pub use config::{FolioConfig, WorkspaceSettings};
pub use telemetry::{LogFormat, init_tracing};

pub use folio_core::*;
pub use folio_error::*;
pub use folio_interface::*;
pub use folio_memory::{VectorIndex, VectorMemory, chunk_text};
pub use folio_models::{
    EmbeddingProviderKind, EmbeddingSettings, HashingEmbedder, LlmProviderKind, LlmSettings,
    OpenAiCompatibleClient, OpenAiEmbeddingClient, build_embedder, build_llm,
};
pub use folio_pipeline::*;
pub use folio_retry::{ResilientEmbedder, ResilientLlm, RetryPolicy};
pub use folio_storage::{FileSystemProjectStore, InMemoryProjectStore};
