//! Stage state machine.

use crate::assembler::{PromptAssembler, PromptTask};
use crate::extraction::parse_json;
use crate::staged::Staged;
use folio_core::{
    Architecture, Blueprint, Chapter, ChapterDirectives, ChapterSpec, ChapterStatus,
    GenerationConfig, ProjectState, RecordSource, Stage, StageInput, StageOutput,
};
use folio_error::{FolioResult, ProviderError, ProviderErrorKind, StageError, StageErrorKind};
use folio_interface::LlmProvider;
use folio_memory::{VectorIndex, VectorMemory};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Artifact to regenerate, discarding what depended on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regenerate {
    /// New architecture; the blueprint and every chapter lose their grounding
    Architecture {
        /// Extra guidance for the new document
        guidance: Option<String>,
    },
    /// New blueprint; every chapter loses its grounding
    Blueprint {
        /// Extra guidance for the new plan
        guidance: Option<String>,
    },
}

impl Regenerate {
    /// Operation name used in errors and spans.
    pub fn operation(&self) -> &'static str {
        match self {
            Regenerate::Architecture { .. } => "regenerate_architecture",
            Regenerate::Blueprint { .. } => "regenerate_blueprint",
        }
    }
}

/// Counts of artifacts touched by an invalidation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// Whether the blueprint was marked stale
    pub blueprint: bool,
    /// Drafted chapters marked stale
    pub drafts: usize,
    /// Finalized chapters flagged as no longer grounded
    pub finalized: usize,
}

/// Mark everything downstream of `target` as stale.
///
/// Drafts become unusable until re-drafted. Finalized text is kept and only
/// flagged, so the author decides whether to revisit it.
pub fn invalidate(state: &mut ProjectState, target: &Regenerate) -> Invalidation {
    let mut invalidation = Invalidation::default();
    if let Regenerate::Architecture { .. } = target {
        if let Some(architecture) = state.architecture.as_mut() {
            architecture.stale = true;
        }
        if let Some(blueprint) = state.blueprint.as_mut() {
            blueprint.stale = true;
            invalidation.blueprint = true;
        }
    }
    for chapter in state.chapters.values_mut() {
        if chapter.status == ChapterStatus::Drafted && !chapter.stale {
            chapter.stale = true;
            invalidation.drafts += 1;
        }
        if chapter.finalized.is_some() && !chapter.grounding_stale {
            chapter.grounding_stale = true;
            invalidation.finalized += 1;
        }
    }
    invalidation
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BlueprintReply {
    Wrapped { chapters: Vec<SpecReply> },
    Bare(Vec<SpecReply>),
}

#[derive(Deserialize)]
struct SpecReply {
    index: u32,
    title: String,
    #[serde(default)]
    synopsis: String,
}

/// Enforces stage order and produces stage artifacts with the language model.
///
/// Every operation works on a clone of the given state and returns the
/// staged result; nothing is visible until the caller commits it.
#[derive(Clone)]
pub struct StageController {
    llm: Arc<dyn LlmProvider>,
    assembler: PromptAssembler,
}

impl std::fmt::Debug for StageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageController")
            .field("llm", &self.llm.provider_name())
            .field("assembler", &self.assembler)
            .finish()
    }
}

impl StageController {
    /// Create a controller.
    pub fn new(llm: Arc<dyn LlmProvider>, assembler: PromptAssembler) -> Self {
        Self { llm, assembler }
    }

    /// Produce the artifact for `input` and advance the stage one step.
    ///
    /// # Errors
    ///
    /// `InvalidStageTransition` when the project is not in the stage the input
    /// requires; provider and memory failures from generation. On error the
    /// given state is untouched and nothing is staged.
    pub async fn advance(
        &self,
        state: &ProjectState,
        memory: &VectorMemory,
        input: &StageInput,
    ) -> FolioResult<Staged<StageOutput>> {
        match input {
            StageInput::Architecture { guidance } => Ok(self
                .generate_architecture(state, memory, guidance.as_deref())
                .await?
                .map(StageOutput::Architecture)),
            StageInput::Blueprint { guidance } => Ok(self
                .generate_blueprint(state, guidance.as_deref())
                .await?
                .map(StageOutput::Blueprint)),
            StageInput::ChapterDraft {
                chapter,
                directives,
            } => Ok(self
                .draft_chapter(state, memory, *chapter, directives)
                .await?
                .map(|drafted| StageOutput::ChapterDraft {
                    chapter: drafted.index,
                    outline: drafted.outline,
                    draft: drafted.draft,
                })),
        }
    }

    /// Generate the architecture document. Requires `Uninitialized`.
    ///
    /// # Errors
    ///
    /// `InvalidStageTransition` in any other stage; provider and memory failures.
    #[instrument(skip(self, state, memory, guidance), fields(project = %state.name(), stage = %state.stage()))]
    pub async fn generate_architecture(
        &self,
        state: &ProjectState,
        memory: &VectorMemory,
        guidance: Option<&str>,
    ) -> FolioResult<Staged<String>> {
        require_stage(state, "generate_architecture", &[Stage::Uninitialized])?;
        self.architecture(state.clone(), memory, guidance).await
    }

    /// Generate the chapter blueprint. Requires `ArchitectureReady`.
    ///
    /// # Errors
    ///
    /// `InvalidStageTransition` in any other stage; `MalformedResponse` when
    /// the reply is not a contiguous plan of the configured length.
    #[instrument(skip(self, state, guidance), fields(project = %state.name(), stage = %state.stage()))]
    pub async fn generate_blueprint(
        &self,
        state: &ProjectState,
        guidance: Option<&str>,
    ) -> FolioResult<Staged<Vec<ChapterSpec>>> {
        require_stage(state, "generate_blueprint", &[Stage::ArchitectureReady])?;
        self.blueprint(state.clone(), guidance).await
    }

    /// Outline and draft one chapter. Requires a current blueprint.
    ///
    /// Both model calls must succeed before anything is staged. Re-drafting
    /// a finalized chapter keeps its finalized text.
    ///
    /// # Errors
    ///
    /// `InvalidStageTransition` before `BlueprintReady`, `ChapterOutOfRange`
    /// outside the blueprint; provider and memory failures.
    #[instrument(skip(self, state, memory, directives), fields(project = %state.name(), stage = %state.stage()))]
    pub async fn draft_chapter(
        &self,
        state: &ProjectState,
        memory: &VectorMemory,
        chapter: u32,
        directives: &ChapterDirectives,
    ) -> FolioResult<Staged<Chapter>> {
        require_stage(
            state,
            "generate_chapter_draft",
            &[
                Stage::BlueprintReady,
                Stage::ChaptersInProgress,
                Stage::Complete,
            ],
        )?;
        self.chapter_draft(state, memory, chapter, directives).await
    }

    /// Regenerate an artifact that later stages already depend on.
    ///
    /// Dependent artifacts are invalidated and the new artifact generated in
    /// one staged change, leaving the project in the stage that follows the
    /// regenerated artifact.
    ///
    /// # Errors
    ///
    /// `InvalidStageTransition` when the artifact has not been generated yet;
    /// provider and memory failures from generation.
    pub async fn regenerate(
        &self,
        state: &ProjectState,
        memory: &VectorMemory,
        target: &Regenerate,
    ) -> FolioResult<Staged<StageOutput>> {
        match target {
            Regenerate::Architecture { guidance } => Ok(self
                .regenerate_architecture(state, memory, guidance.as_deref())
                .await?
                .map(StageOutput::Architecture)),
            Regenerate::Blueprint { guidance } => Ok(self
                .regenerate_blueprint(state, guidance.as_deref())
                .await?
                .map(StageOutput::Blueprint)),
        }
    }

    /// Replace the architecture, invalidating the blueprint and every chapter.
    ///
    /// # Errors
    ///
    /// `InvalidStageTransition` before an architecture exists; provider and
    /// memory failures.
    #[instrument(skip(self, state, memory, guidance), fields(project = %state.name(), stage = %state.stage()))]
    pub async fn regenerate_architecture(
        &self,
        state: &ProjectState,
        memory: &VectorMemory,
        guidance: Option<&str>,
    ) -> FolioResult<Staged<String>> {
        let target = Regenerate::Architecture {
            guidance: guidance.map(str::to_string),
        };
        let staged = prepare_regenerate(state, &target)?;
        self.architecture(staged, memory, guidance).await
    }

    /// Replace the blueprint, invalidating every chapter.
    ///
    /// # Errors
    ///
    /// `InvalidStageTransition` before a blueprint exists; provider failures.
    #[instrument(skip(self, state, guidance), fields(project = %state.name(), stage = %state.stage()))]
    pub async fn regenerate_blueprint(
        &self,
        state: &ProjectState,
        guidance: Option<&str>,
    ) -> FolioResult<Staged<Vec<ChapterSpec>>> {
        let target = Regenerate::Blueprint {
            guidance: guidance.map(str::to_string),
        };
        let staged = prepare_regenerate(state, &target)?;
        self.blueprint(staged, guidance).await
    }

    async fn architecture(
        &self,
        mut staged: ProjectState,
        memory: &VectorMemory,
        guidance: Option<&str>,
    ) -> FolioResult<Staged<String>> {
        let prompt = self
            .assembler
            .build(&staged, PromptTask::Architecture { guidance }, &[])?;
        let text = complete(self.llm.as_ref(), "architecture", &prompt).await?;

        let chunks = memory
            .embed_chunks(&text, self.assembler.settings().chunk_chars())
            .await?;
        let mut index: VectorIndex = memory.snapshot().await;
        let (removed, inserted) = index.replace_source(&RecordSource::Architecture, chunks)?;
        debug!(removed, inserted, "Staged architecture records");

        staged.architecture = Some(Architecture::new(text.clone()));
        staged.set_stage(Stage::ArchitectureReady);
        Ok(Staged::new(text, staged).with_index(index))
    }

    async fn blueprint(
        &self,
        mut staged: ProjectState,
        guidance: Option<&str>,
    ) -> FolioResult<Staged<Vec<ChapterSpec>>> {
        let prompt = self
            .assembler
            .build(&staged, PromptTask::Blueprint { guidance }, &[])?;
        let raw = complete(self.llm.as_ref(), "blueprint", &prompt).await?;

        let specs: Vec<ChapterSpec> = match parse_json::<BlueprintReply>(&raw)? {
            BlueprintReply::Wrapped { chapters } | BlueprintReply::Bare(chapters) => chapters
                .into_iter()
                .map(|spec| ChapterSpec::new(spec.index, spec.title.trim(), spec.synopsis.trim()))
                .collect(),
        };
        let blueprint = Blueprint::new(specs, staged.project.config().num_chapters())
            .map_err(|reason| ProviderError::new(ProviderErrorKind::MalformedResponse(reason)))?;
        info!(chapters = blueprint.len(), "Blueprint generated");

        let chapters = blueprint.chapters().to_vec();
        staged.blueprint = Some(blueprint);
        staged.set_stage(Stage::BlueprintReady);
        Ok(Staged::new(chapters, staged))
    }

    async fn chapter_draft(
        &self,
        state: &ProjectState,
        memory: &VectorMemory,
        chapter: u32,
        directives: &ChapterDirectives,
    ) -> FolioResult<Staged<Chapter>> {
        let spec = state.chapter_spec(chapter)?;
        let k = directives
            .retrieval_k
            .unwrap_or(self.assembler.settings().retrieval_k());
        let query = PromptAssembler::retrieval_query(spec, directives);
        let own_source = RecordSource::Chapter(chapter);
        let retrieved = memory
            .query_filtered(&query, k, move |record| record.source != own_source)
            .await?;
        debug!(retrieved = retrieved.len(), k, "Retrieved context for draft");

        let outline_prompt = self.assembler.build(
            state,
            PromptTask::ChapterOutline {
                chapter,
                directives,
            },
            &retrieved,
        )?;
        let outline = complete(self.llm.as_ref(), "chapter_outline", &outline_prompt).await?;

        let draft_prompt = self.assembler.build(
            state,
            PromptTask::ChapterDraft {
                chapter,
                directives,
                outline: &outline,
            },
            &retrieved,
        )?;
        let draft = complete(self.llm.as_ref(), "chapter_draft", &draft_prompt).await?;
        info!(chapter, draft_chars = draft.len(), "Chapter drafted");

        let mut staged = state.clone();
        let drafted = staged
            .chapters
            .entry(chapter)
            .and_modify(|existing| existing.redraft(outline.clone(), draft.clone()))
            .or_insert_with(|| Chapter::drafted(chapter, outline, draft))
            .clone();
        if staged.stage() == Stage::BlueprintReady {
            staged.set_stage(Stage::ChaptersInProgress);
        }
        Ok(Staged::new(drafted, staged))
    }
}

fn prepare_regenerate(state: &ProjectState, target: &Regenerate) -> FolioResult<ProjectState> {
    let minimum = match target {
        Regenerate::Architecture { .. } => Stage::ArchitectureReady,
        Regenerate::Blueprint { .. } => Stage::BlueprintReady,
    };
    if state.stage() < minimum {
        return Err(transition_error(
            target.operation(),
            &format!("{minimum} or later"),
            state.stage(),
        ));
    }

    let mut staged = state.clone();
    let invalidation = invalidate(&mut staged, target);
    if invalidation.finalized > 0 {
        warn!(
            finalized = invalidation.finalized,
            "Finalized chapters no longer match the regenerated grounding"
        );
    }
    info!(
        blueprint = invalidation.blueprint,
        drafts = invalidation.drafts,
        "Invalidated dependent artifacts"
    );
    Ok(staged)
}

pub(crate) fn transition_error(
    operation: &str,
    required: &str,
    actual: Stage,
) -> folio_error::FolioError {
    StageError::new(StageErrorKind::InvalidStageTransition {
        operation: operation.to_string(),
        required: required.to_string(),
        actual: actual.to_string(),
    })
    .into()
}

fn require_stage(state: &ProjectState, operation: &str, accepted: &[Stage]) -> FolioResult<()> {
    if accepted.contains(&state.stage()) {
        return Ok(());
    }
    let required = accepted
        .iter()
        .map(Stage::to_string)
        .collect::<Vec<_>>()
        .join(" or ");
    Err(transition_error(operation, &required, state.stage()))
}

/// Call the model with a task label, rejecting blank output.
pub(crate) async fn complete(
    llm: &dyn LlmProvider,
    label: &str,
    prompt: &str,
) -> FolioResult<String> {
    let config = GenerationConfig::for_task(label);
    let text = llm.complete(prompt, &config).await?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::new(ProviderErrorKind::MalformedResponse(format!(
            "empty {label} response"
        )))
        .into());
    }
    debug!(label, prompt_chars = prompt.len(), response_chars = text.len(), "Model call complete");
    Ok(text.to_string())
}
