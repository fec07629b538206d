//! Per-call generation parameters and drafting directives.

use serde::{Deserialize, Serialize};

/// Parameters passed with every language-model call.
///
/// `label` names the task (`architecture`, `chapter_draft`, ...) so providers
/// and spans can tell calls apart.
///
/// # Examples
///
/// ```
/// use folio_core::GenerationConfig;
///
/// let config = GenerationConfig::for_task("consistency").with_temperature(Some(0.0));
/// assert_eq!(config.label, "consistency");
/// assert_eq!(config.temperature, Some(0.0));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct GenerationConfig {
    /// Task label
    pub label: String,
    /// Sampling temperature override
    pub temperature: Option<f32>,
    /// Maximum tokens override
    pub max_tokens: Option<u32>,
    /// Model override
    pub model: Option<String>,
}

impl GenerationConfig {
    /// Config for a labelled task with provider defaults.
    pub fn for_task(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Caller directives for drafting a single chapter.
///
/// # Examples
///
/// ```
/// use folio_core::ChapterDirectives;
///
/// let directives = ChapterDirectives::builder()
///     .characters_involved(vec!["Mara".to_string()])
///     .scene_location("the lamp room")
///     .retrieval_k(Some(2usize))
///     .build()
///     .unwrap();
///
/// assert_eq!(directives.scene_location, "the lamp room");
/// assert!(directives.user_guidance.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into), default)]
pub struct ChapterDirectives {
    /// Free-form guidance for this chapter
    #[serde(default)]
    pub user_guidance: String,
    /// Characters that must appear
    #[serde(default)]
    pub characters_involved: Vec<String>,
    /// Items that matter in this chapter
    #[serde(default)]
    pub key_items: String,
    /// Where the chapter takes place
    #[serde(default)]
    pub scene_location: String,
    /// Time pressure or period
    #[serde(default)]
    pub time_constraint: String,
    /// Retrieval depth override
    #[serde(default)]
    pub retrieval_k: Option<usize>,
    /// Word target override
    #[serde(default)]
    pub words: Option<u32>,
    /// Replaces the drafting instruction block; context sections are kept
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

impl ChapterDirectives {
    /// Creates a new directives builder.
    pub fn builder() -> ChapterDirectivesBuilder {
        ChapterDirectivesBuilder::default()
    }
}
