//! Tunables for prompt assembly and retrieval.

use serde::{Deserialize, Serialize};

/// Pipeline settings shared by the assembler, committer and checker.
///
/// # Examples
///
/// ```
/// use folio_core::PipelineSettings;
///
/// let settings = PipelineSettings::builder()
///     .retrieval_k(2usize)
///     .build()
///     .unwrap();
/// assert_eq!(settings.retrieval_k(), 2);
/// assert_eq!(settings.consistency_k(), 4);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(default)]
pub struct PipelineSettings {
    /// Records retrieved for chapter drafts
    #[serde(default = "default_retrieval_k")]
    #[getter(copy)]
    retrieval_k: usize,
    /// Records retrieved for consistency checks
    #[serde(default = "default_retrieval_k")]
    #[getter(copy)]
    consistency_k: usize,
    /// Character budget of an assembled prompt
    #[serde(default = "default_max_prompt_chars")]
    #[getter(copy)]
    max_prompt_chars: usize,
    /// Target characters per vector memory chunk
    #[serde(default = "default_chunk_chars")]
    #[getter(copy)]
    chunk_chars: usize,
}

fn default_retrieval_k() -> usize {
    4
}

fn default_max_prompt_chars() -> usize {
    24_000
}

fn default_chunk_chars() -> usize {
    1_200
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            retrieval_k: default_retrieval_k(),
            consistency_k: default_retrieval_k(),
            max_prompt_chars: default_max_prompt_chars(),
            chunk_chars: default_chunk_chars(),
        }
    }
}

impl PipelineSettings {
    /// Creates a new settings builder.
    pub fn builder() -> PipelineSettingsBuilder {
        PipelineSettingsBuilder::default()
    }
}
