//! Read-only project and workspace reports.

use folio_core::{ChapterStatus, ProjectState, Stage};
use serde::Serialize;

/// One blueprint slot as seen by a status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterLine {
    /// Chapter index
    pub index: u32,
    /// Title from the blueprint
    pub title: String,
    /// Lifecycle status, `None` when not drafted yet
    pub status: Option<ChapterStatus>,
    /// Draft invalidated by a regenerate
    pub stale: bool,
    /// Finalized text predates the current grounding
    pub grounding_stale: bool,
    /// Whether finalized text exists
    pub has_final: bool,
}

/// Snapshot of a project's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStatus {
    /// Project name
    pub name: String,
    /// Current stage
    pub stage: Stage,
    /// Committed revision
    pub revision: u64,
    /// Architecture present and current
    pub architecture: ArtifactState,
    /// Blueprint present and current
    pub blueprint: ArtifactState,
    /// Every blueprint slot in order
    pub chapters: Vec<ChapterLine>,
    /// Chapters with at least one summary
    pub summarised_chapters: usize,
    /// Known characters
    pub characters: usize,
    /// Open plot threads
    pub open_threads: usize,
    /// Live vector memory records
    pub vector_records: usize,
}

/// Presence of a stage artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactState {
    /// Not generated
    Missing,
    /// Generated and current
    Current,
    /// Generated, then invalidated by a regenerate upstream
    Stale,
}

impl ArtifactState {
    fn of(present: bool, stale: bool) -> Self {
        match (present, stale) {
            (false, _) => ArtifactState::Missing,
            (true, false) => ArtifactState::Current,
            (true, true) => ArtifactState::Stale,
        }
    }
}

impl ProjectStatus {
    /// Build a report from committed state and the live record count.
    pub fn from_state(state: &ProjectState, vector_records: usize) -> Self {
        let chapters = state
            .blueprint
            .as_ref()
            .map(|blueprint| {
                blueprint
                    .chapters()
                    .iter()
                    .map(|spec| {
                        let chapter = state.chapter(spec.index);
                        ChapterLine {
                            index: spec.index,
                            title: spec.title.clone(),
                            status: chapter.map(|c| c.status),
                            stale: chapter.is_some_and(|c| c.stale),
                            grounding_stale: chapter.is_some_and(|c| c.grounding_stale),
                            has_final: chapter.is_some_and(|c| c.finalized.is_some()),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: state.name().to_string(),
            stage: state.stage(),
            revision: state.project.revision(),
            architecture: ArtifactState::of(
                state.architecture.is_some(),
                state.architecture.as_ref().is_some_and(|a| a.stale),
            ),
            blueprint: ArtifactState::of(
                state.blueprint.is_some(),
                state.blueprint.as_ref().is_some_and(|b| b.stale),
            ),
            chapters,
            summarised_chapters: state.global_summary.current().len(),
            characters: state.characters.len(),
            open_threads: state.plot_arcs.open().len(),
            vector_records,
        }
    }
}

/// Providers and storage the workspace is wired to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Language-model provider name
    pub llm_provider: String,
    /// Language-model identifier
    pub llm_model: String,
    /// Embedding provider name
    pub embedding_provider: String,
    /// Embedding model identifier
    pub embedding_model: String,
    /// Where projects are stored
    pub store: String,
    /// Stored project names
    pub projects: Vec<String>,
}
