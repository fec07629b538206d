//! Chapter lifecycle.

use serde::{Deserialize, Serialize};

/// Status of a chapter slot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum ChapterStatus {
    /// Draft stored, awaiting approval
    Drafted,
    /// Draft committed as canonical text
    Finalized,
}

/// One chapter of a project.
///
/// Re-drafting a finalized chapter moves it back to `Drafted` but keeps the
/// previous finalized text until the chapter is finalized again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter index, 1-based
    pub index: u32,
    /// Lifecycle status
    pub status: ChapterStatus,
    /// Outline produced before the draft
    pub outline: String,
    /// Latest draft text
    pub draft: String,
    /// Canonical text, present once finalized
    pub finalized: Option<String>,
    /// Draft was invalidated by an upstream regenerate
    #[serde(default)]
    pub stale: bool,
    /// Finalized text predates the current architecture or blueprint
    #[serde(default)]
    pub grounding_stale: bool,
}

impl Chapter {
    /// A freshly drafted chapter.
    pub fn drafted(index: u32, outline: impl Into<String>, draft: impl Into<String>) -> Self {
        Self {
            index,
            status: ChapterStatus::Drafted,
            outline: outline.into(),
            draft: draft.into(),
            finalized: None,
            stale: false,
            grounding_stale: false,
        }
    }

    /// Replace the outline and draft, keeping any finalized text.
    pub fn redraft(&mut self, outline: impl Into<String>, draft: impl Into<String>) {
        self.outline = outline.into();
        self.draft = draft.into();
        self.status = ChapterStatus::Drafted;
        self.stale = false;
    }

    /// Whether the chapter holds a current draft that may be finalized.
    pub fn is_finalizable(&self) -> bool {
        self.status == ChapterStatus::Drafted && !self.stale && !self.draft.trim().is_empty()
    }

    /// Finalized text when present, otherwise the draft.
    pub fn best_text(&self) -> &str {
        match (&self.status, &self.finalized) {
            (ChapterStatus::Finalized, Some(text)) => text,
            _ => &self.draft,
        }
    }
}
