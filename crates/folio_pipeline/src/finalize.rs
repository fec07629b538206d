//! Chapter finalization.

use crate::assembler::{PromptAssembler, PromptTask};
use crate::controller::{complete, transition_error};
use crate::extraction::parse_json;
use crate::staged::Staged;
use folio_core::{
    CharacterUpdate, ChapterStatus, FinalizationResult, PlotUpdate, ProjectState, RecordSource,
    Stage,
};
use folio_error::{
    FolioResult, ProviderError, ProviderErrorKind, StageError, StageErrorKind, WorkspaceError,
    WorkspaceErrorKind,
};
use folio_interface::LlmProvider;
use folio_memory::VectorMemory;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Derived state the model extracts from approved chapter text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChapterDigest {
    /// Summary appended to the global summary
    pub summary: String,
    /// Character facts and arc positions
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterUpdate>,
    /// Threads the chapter opens
    #[serde(default, alias = "opened_threads")]
    pub new_threads: Vec<String>,
    /// Ids of open threads the chapter resolves
    #[serde(default)]
    pub resolved_threads: Vec<u32>,
}

/// Commits approved chapter text and everything derived from it as one change.
///
/// The model call, chunking and embedding all happen before any state is
/// touched; the chapter, global summary, character state, plot arcs and
/// vector records are then updated together on a staged copy.
#[derive(Clone)]
pub struct FinalizationCommitter {
    llm: Arc<dyn LlmProvider>,
    assembler: PromptAssembler,
}

impl std::fmt::Debug for FinalizationCommitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalizationCommitter")
            .field("llm", &self.llm.provider_name())
            .finish_non_exhaustive()
    }
}

impl FinalizationCommitter {
    /// Create a committer.
    pub fn new(llm: Arc<dyn LlmProvider>, assembler: PromptAssembler) -> Self {
        Self { llm, assembler }
    }

    /// Finalize `chapter` with `approved` text, or with its current draft when `None`.
    ///
    /// # Errors
    ///
    /// - `InvalidStageTransition` before a blueprint exists.
    /// - `ChapterOutOfRange` outside the blueprint.
    /// - `ChapterNotDrafted` without a current, non-stale draft.
    /// - `InvalidInput` for blank approved text.
    /// - Provider, extraction and memory failures. The chapter stays drafted.
    #[instrument(skip(self, state, memory, approved), fields(project = %state.name()))]
    pub async fn finalize(
        &self,
        state: &ProjectState,
        memory: &VectorMemory,
        chapter: u32,
        approved: Option<&str>,
    ) -> FolioResult<Staged<FinalizationResult>> {
        if !state.stage().allows_chapter_work() {
            return Err(transition_error(
                "finalize_chapter",
                &format!("{} or later", Stage::BlueprintReady),
                state.stage(),
            ));
        }
        state.chapter_spec(chapter)?;
        let current = state.chapter(chapter).ok_or_else(|| {
            StageError::new(StageErrorKind::ChapterNotDrafted {
                chapter,
                reason: "no draft exists".to_string(),
            })
        })?;
        if !current.is_finalizable() {
            let reason = if current.stale {
                "the draft was invalidated by a regenerate"
            } else if current.status == ChapterStatus::Finalized {
                "already finalized; re-draft before finalizing again"
            } else {
                "the draft is empty"
            };
            return Err(StageError::new(StageErrorKind::ChapterNotDrafted {
                chapter,
                reason: reason.to_string(),
            })
            .into());
        }

        let text = approved.unwrap_or(current.draft.as_str()).trim().to_string();
        if text.is_empty() {
            return Err(WorkspaceError::new(WorkspaceErrorKind::InvalidInput(
                "approved chapter text is empty".to_string(),
            ))
            .into());
        }

        let prompt = self
            .assembler
            .build(state, PromptTask::Finalization { chapter, text: &text }, &[])?;
        let reply = complete(self.llm.as_ref(), "finalization", &prompt).await?;
        let digest: ChapterDigest = parse_json(&reply)?;
        if digest.summary.trim().is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::MalformedResponse(
                "finalization reply carried an empty summary".to_string(),
            ))
            .into());
        }

        let chunks = memory
            .embed_chunks(&text, self.assembler.settings().chunk_chars())
            .await?;
        let mut index = memory.snapshot().await;
        let (records_replaced, records_indexed) =
            index.replace_source(&RecordSource::Chapter(chapter), chunks)?;

        let mut staged = state.clone();
        if let Some(entry) = staged.chapters.get_mut(&chapter) {
            entry.status = ChapterStatus::Finalized;
            entry.finalized = Some(text);
            entry.stale = false;
            entry.grounding_stale = false;
        }
        let summary = digest.summary.trim().to_string();
        let summary_revision = staged.global_summary.append(chapter, summary.clone());
        let merge_conflicts = staged.characters.merge(chapter, &digest.characters);
        let (opened_threads, resolved_threads) = staged.plot_arcs.apply(
            chapter,
            &PlotUpdate {
                opened: digest.new_threads,
                resolved: digest.resolved_threads,
            },
        );
        if staged.all_finalized() {
            staged.set_stage(Stage::Complete);
        }
        for conflict in &merge_conflicts {
            warn!(
                character = %conflict.character,
                attribute = %conflict.attribute,
                established = %conflict.established,
                proposed = %conflict.proposed,
                "Chapter contradicts an established character fact"
            );
        }
        info!(
            chapter,
            summary_revision,
            records_indexed,
            records_replaced,
            stage = %staged.stage(),
            "Chapter finalization staged"
        );

        let result = FinalizationResult {
            chapter,
            summary_revision,
            summary,
            merge_conflicts,
            opened_threads,
            resolved_threads,
            records_indexed,
            records_replaced,
            stage: staged.stage(),
        };
        Ok(Staged::new(result, staged).with_index(index))
    }
}
