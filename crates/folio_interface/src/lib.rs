//! Trait definitions for the folio narrative pipeline.
//!
//! The pipeline consumes two provider capabilities, [`LlmProvider`] and
//! [`EmbeddingProvider`], and persists through a [`ProjectStore`]. Concrete
//! implementations live in `folio_models` and `folio_storage`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod store;
mod traits;

pub use store::{ProjectStore, StoredProject};
pub use traits::{EmbeddingProvider, LlmProvider};
