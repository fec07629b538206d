//! Project lifecycle stages.

use crate::{ChapterDirectives, ChapterSpec};
use serde::{Deserialize, Serialize};

/// Discrete phase of a project's generation lifecycle.
///
/// Stages are totally ordered; a project only moves forward one step at a
/// time except through an explicit regenerate.
///
/// # Examples
///
/// ```
/// use folio_core::Stage;
///
/// assert!(Stage::Uninitialized < Stage::ArchitectureReady);
/// assert_eq!(Stage::BlueprintReady.next(), Some(Stage::ChaptersInProgress));
/// assert_eq!(Stage::Complete.next(), None);
/// assert_eq!(format!("{}", Stage::ChaptersInProgress), "ChaptersInProgress");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
pub enum Stage {
    /// Project exists but nothing has been generated
    #[default]
    Uninitialized,
    /// Architecture document generated
    ArchitectureReady,
    /// Chapter blueprint generated
    BlueprintReady,
    /// At least one chapter drafted
    ChaptersInProgress,
    /// Every chapter has been finalized at least once.
    ///
    /// Re-drafting a chapter here keeps the stage; the chapter itself reports
    /// `Drafted` until it is finalized again. Only a regenerate moves a
    /// project back out of `Complete`.
    Complete,
}

impl Stage {
    /// The stage one step forward, if any.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Uninitialized => Some(Stage::ArchitectureReady),
            Stage::ArchitectureReady => Some(Stage::BlueprintReady),
            Stage::BlueprintReady => Some(Stage::ChaptersInProgress),
            Stage::ChaptersInProgress => Some(Stage::Complete),
            Stage::Complete => None,
        }
    }

    /// Whether chapters may be drafted or finalized in this stage.
    pub fn allows_chapter_work(self) -> bool {
        self >= Stage::BlueprintReady
    }
}

/// Input for a single forward stage advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageInput {
    /// Generate the architecture document
    Architecture {
        /// Extra guidance layered over the project configuration
        guidance: Option<String>,
    },
    /// Generate the chapter blueprint
    Blueprint {
        /// Extra guidance layered over the project configuration
        guidance: Option<String>,
    },
    /// Draft (or re-draft) one chapter
    ChapterDraft {
        /// Chapter index, 1-based
        chapter: u32,
        /// Per-request drafting directives
        directives: ChapterDirectives,
    },
}

impl StageInput {
    /// Operation name used in errors and spans.
    pub fn operation(&self) -> &'static str {
        match self {
            StageInput::Architecture { .. } => "generate_architecture",
            StageInput::Blueprint { .. } => "generate_blueprint",
            StageInput::ChapterDraft { .. } => "generate_chapter_draft",
        }
    }
}

/// Artifact produced by a stage advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageOutput {
    /// Architecture document text
    Architecture(String),
    /// Ordered chapter specifications
    Blueprint(Vec<ChapterSpec>),
    /// Outline and draft for one chapter
    ChapterDraft {
        /// Chapter index
        chapter: u32,
        /// Outline produced before drafting
        outline: String,
        /// Draft text
        draft: String,
    },
}
