//! Aggregate project state.

use crate::{
    Architecture, Blueprint, Chapter, ChapterSpec, ChapterStatus, CharacterState, GlobalSummary,
    PlotArcs, Project, ProjectConfig, Stage,
};
use folio_error::{FolioResult, StageError, StageErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every durable artifact of one project except its vector memory.
///
/// Mutations are applied to a clone and committed as a whole, so a value of
/// this type is always a consistent snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Identity, stage and configuration
    pub project: Project,
    /// Architecture document
    pub architecture: Option<Architecture>,
    /// Chapter blueprint
    pub blueprint: Option<Blueprint>,
    /// Chapters keyed by index
    pub chapters: BTreeMap<u32, Chapter>,
    /// Append-only summary log
    pub global_summary: GlobalSummary,
    /// Merged character knowledge
    pub characters: CharacterState,
    /// Plot threads
    pub plot_arcs: PlotArcs,
}

impl ProjectState {
    /// Empty state for a new project.
    pub fn new(name: impl Into<String>, config: ProjectConfig) -> Self {
        Self {
            project: Project::new(name, config),
            architecture: None,
            blueprint: None,
            chapters: BTreeMap::new(),
            global_summary: GlobalSummary::default(),
            characters: CharacterState::default(),
            plot_arcs: PlotArcs::default(),
        }
    }

    /// Project name.
    pub fn name(&self) -> &str {
        self.project.name()
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.project.stage()
    }

    /// Set the stage. Callers enforce ordering.
    pub fn set_stage(&mut self, stage: Stage) {
        self.project.set_stage(stage);
    }

    /// Record that this snapshot is about to be committed.
    pub fn bump_revision(&mut self) {
        self.project.bump_revision();
    }

    /// Spec for a chapter, checking that the blueprint exists and covers the index.
    ///
    /// # Errors
    ///
    /// `MissingArtifact` without a blueprint, `ChapterOutOfRange` outside `1..=N`.
    pub fn chapter_spec(&self, index: u32) -> FolioResult<&ChapterSpec> {
        let blueprint = self.blueprint.as_ref().ok_or_else(|| {
            StageError::new(StageErrorKind::MissingArtifact("blueprint".to_string()))
        })?;
        blueprint.chapter(index).ok_or_else(|| {
            StageError::new(StageErrorKind::ChapterOutOfRange {
                chapter: index,
                max: blueprint.len() as u32,
            })
            .into()
        })
    }

    /// Chapter by index.
    pub fn chapter(&self, index: u32) -> Option<&Chapter> {
        self.chapters.get(&index)
    }

    /// The chapter immediately before `index`, if stored.
    pub fn previous_chapter(&self, index: u32) -> Option<&Chapter> {
        index.checked_sub(1).and_then(|prev| self.chapters.get(&prev))
    }

    /// Whether every blueprint chapter holds current finalized text.
    pub fn all_finalized(&self) -> bool {
        match &self.blueprint {
            Some(blueprint) if !blueprint.is_empty() => blueprint.chapters().iter().all(|spec| {
                self.chapters.get(&spec.index).is_some_and(|chapter| {
                    chapter.status == ChapterStatus::Finalized && chapter.finalized.is_some()
                })
            }),
            _ => false,
        }
    }
}
