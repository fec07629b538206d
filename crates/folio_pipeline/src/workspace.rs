//! Project operations with serialized, all-or-nothing commits.

use crate::assembler::PromptAssembler;
use crate::consistency::ConsistencyChecker;
use crate::controller::StageController;
use crate::finalize::FinalizationCommitter;
use crate::lease::{ProjectLease, ProjectLocks};
use crate::staged::Staged;
use crate::status::{HealthReport, ProjectStatus};
use folio_core::{
    Chapter, ChapterDirectives, ChapterSpec, CharacterState, ConsistencyReport,
    FinalizationResult, GlobalSummary, PipelineSettings, PlotArcs, Project, ProjectConfig,
    ProjectState, RecordSource, VectorRecord,
};
use folio_error::{
    FolioError, FolioResult, PersistenceError, PersistenceErrorKind, WorkspaceError, WorkspaceErrorKind,
};
use folio_interface::{EmbeddingProvider, LlmProvider, ProjectStore, StoredProject};
use folio_memory::{VectorIndex, VectorMemory};
use folio_retry::{ResilientEmbedder, ResilientLlm, RetryPolicy};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// A project held in memory between requests.
struct OpenProject {
    state: RwLock<ProjectState>,
    memory: VectorMemory,
}

impl OpenProject {
    fn new(stored: StoredProject, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            state: RwLock::new(stored.state),
            memory: VectorMemory::with_index(embedder, VectorIndex::from_records(stored.records)),
        }
    }
}

/// Every project operation exposed to front ends.
///
/// Mutations of one project are serialized by a lease: a concurrent request
/// for the same project fails with `ProjectBusy`. Each mutation runs against
/// a snapshot, then commits the new state and vector records to the store in
/// one step before swapping them into memory. A failure anywhere before the
/// commit leaves the project exactly as it was.
///
/// Commits run on a spawned task, so dropping a request future after its
/// model calls have returned still completes the commit rather than
/// splitting it.
pub struct Workspace {
    store: Arc<dyn ProjectStore>,
    llm: Arc<dyn LlmProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    settings: PipelineSettings,
    controller: StageController,
    committer: FinalizationCommitter,
    checker: ConsistencyChecker,
    locks: ProjectLocks,
    open: RwLock<HashMap<String, Arc<OpenProject>>>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("store", &self.store.location())
            .field("llm", &self.llm.provider_name())
            .field("embedder", &self.embedder.provider_name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Create a workspace. Provider calls are wrapped with `retry`.
    pub fn new(
        store: Arc<dyn ProjectStore>,
        llm: Arc<dyn LlmProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: PipelineSettings,
        retry: RetryPolicy,
    ) -> Self {
        let llm: Arc<dyn LlmProvider> = Arc::new(ResilientLlm::new(llm, retry.clone()));
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(ResilientEmbedder::new(embedder, retry));
        let assembler = PromptAssembler::new(settings.clone());
        Self {
            store,
            controller: StageController::new(llm.clone(), assembler.clone()),
            committer: FinalizationCommitter::new(llm.clone(), assembler.clone()),
            checker: ConsistencyChecker::new(llm.clone(), assembler),
            llm,
            embedder,
            settings,
            locks: ProjectLocks::default(),
            open: RwLock::new(HashMap::new()),
        }
    }

    /// Pipeline settings in effect.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Mutation leases, for callers that need to observe busy projects.
    pub fn locks(&self) -> &ProjectLocks {
        &self.locks
    }

    /// Create `name` with `config`, or load it when it already exists.
    ///
    /// An existing project keeps its stored configuration.
    ///
    /// # Errors
    ///
    /// `InvalidProjectName`, `InvalidInput` for a bad configuration,
    /// `ProjectBusy`, and persistence failures.
    #[instrument(skip(self, config))]
    pub async fn create_or_load_project(
        &self,
        name: &str,
        config: ProjectConfig,
    ) -> FolioResult<Project> {
        Project::validate_name(name)?;
        config.validate()?;
        let lease = self.locks.try_acquire(name)?;

        if let Some(project) = self.find(name).await? {
            let state = project.state.read().await;
            if state.project.config() != &config {
                info!(project = name, "Keeping stored configuration of existing project");
            }
            return Ok(state.project.clone());
        }

        let fresh = ProjectState::new(name, config);
        let project = Arc::new(OpenProject::new(
            StoredProject {
                state: fresh.clone(),
                records: Vec::new(),
            },
            self.embedder.clone(),
        ));
        self.commit(project.clone(), lease, Staged::new((), fresh))
            .await?;
        self.open.write().await.insert(name.to_string(), project.clone());
        info!(project = name, "Project created");
        let created = project.state.read().await.project.clone();
        Ok(created)
    }

    /// Generate the architecture document.
    ///
    /// # Errors
    ///
    /// See [`StageController::generate_architecture`]; `ProjectNotFound`, `ProjectBusy`.
    pub async fn generate_architecture(
        &self,
        name: &str,
        guidance: Option<&str>,
    ) -> FolioResult<String> {
        let (lease, project) = self.begin(name).await?;
        let state = project.state.read().await.clone();
        let staged = self
            .controller
            .generate_architecture(&state, &project.memory, guidance)
            .await?;
        self.commit(project, lease, staged).await
    }

    /// Generate the chapter blueprint.
    ///
    /// # Errors
    ///
    /// See [`StageController::generate_blueprint`]; `ProjectNotFound`, `ProjectBusy`.
    pub async fn generate_blueprint(
        &self,
        name: &str,
        guidance: Option<&str>,
    ) -> FolioResult<Vec<ChapterSpec>> {
        let (lease, project) = self.begin(name).await?;
        let state = project.state.read().await.clone();
        let staged = self.controller.generate_blueprint(&state, guidance).await?;
        self.commit(project, lease, staged).await
    }

    /// Outline and draft one chapter.
    ///
    /// # Errors
    ///
    /// See [`StageController::draft_chapter`]; `ProjectNotFound`, `ProjectBusy`.
    pub async fn generate_chapter_draft(
        &self,
        name: &str,
        chapter: u32,
        directives: &ChapterDirectives,
    ) -> FolioResult<Chapter> {
        let (lease, project) = self.begin(name).await?;
        let state = project.state.read().await.clone();
        let staged = self
            .controller
            .draft_chapter(&state, &project.memory, chapter, directives)
            .await?;
        self.commit(project, lease, staged).await
    }

    /// Finalize a chapter with `approved` text, or its current draft.
    ///
    /// # Errors
    ///
    /// See [`FinalizationCommitter::finalize`]; `ProjectNotFound`, `ProjectBusy`.
    pub async fn finalize_chapter(
        &self,
        name: &str,
        chapter: u32,
        approved: Option<&str>,
    ) -> FolioResult<FinalizationResult> {
        let (lease, project) = self.begin(name).await?;
        let state = project.state.read().await.clone();
        let staged = self
            .committer
            .finalize(&state, &project.memory, chapter, approved)
            .await?;
        self.commit(project, lease, staged).await
    }

    /// Replace the architecture and invalidate everything built on it.
    ///
    /// # Errors
    ///
    /// See [`StageController::regenerate_architecture`]; `ProjectNotFound`, `ProjectBusy`.
    pub async fn regenerate_architecture(
        &self,
        name: &str,
        guidance: Option<&str>,
    ) -> FolioResult<String> {
        let (lease, project) = self.begin(name).await?;
        let state = project.state.read().await.clone();
        let staged = self
            .controller
            .regenerate_architecture(&state, &project.memory, guidance)
            .await?;
        self.commit(project, lease, staged).await
    }

    /// Replace the blueprint and invalidate every chapter.
    ///
    /// # Errors
    ///
    /// See [`StageController::regenerate_blueprint`]; `ProjectNotFound`, `ProjectBusy`.
    pub async fn regenerate_blueprint(
        &self,
        name: &str,
        guidance: Option<&str>,
    ) -> FolioResult<Vec<ChapterSpec>> {
        let (lease, project) = self.begin(name).await?;
        let state = project.state.read().await.clone();
        let staged = self
            .controller
            .regenerate_blueprint(&state, guidance)
            .await?;
        self.commit(project, lease, staged).await
    }

    /// Check a chapter for contradictions. Never mutates the project.
    ///
    /// # Errors
    ///
    /// See [`ConsistencyChecker::check`]; `ProjectNotFound`.
    pub async fn check_consistency(
        &self,
        name: &str,
        chapter: u32,
    ) -> FolioResult<ConsistencyReport> {
        let project = self.require(name).await?;
        let state = project.state.read().await.clone();
        self.checker.check(&state, &project.memory, chapter).await
    }

    /// Index a reference document, replacing an earlier document of the same name.
    ///
    /// Returns the number of records indexed.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank name or text; embedding, memory and
    /// persistence failures; `ProjectNotFound`, `ProjectBusy`.
    #[instrument(skip(self, text), fields(text_chars = text.len()))]
    pub async fn import_reference_document(
        &self,
        name: &str,
        document: &str,
        text: &str,
    ) -> FolioResult<usize> {
        if document.trim().is_empty() || text.trim().is_empty() {
            return Err(WorkspaceError::new(WorkspaceErrorKind::InvalidInput(
                "reference documents need a name and non-empty text".to_string(),
            ))
            .into());
        }
        let (lease, project) = self.begin(name).await?;
        let state = project.state.read().await.clone();
        let chunks = project
            .memory
            .embed_chunks(text, self.settings.chunk_chars())
            .await?;
        let mut index = project.memory.snapshot().await;
        let (removed, inserted) =
            index.replace_source(&RecordSource::Reference(document.trim().to_string()), chunks)?;
        debug!(removed, inserted, "Staged reference records");
        self.commit(project, lease, Staged::new(inserted, state).with_index(index))
            .await
    }

    /// Remove every vector memory record. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Persistence failures; `ProjectNotFound`, `ProjectBusy`.
    #[instrument(skip(self))]
    pub async fn clear_vector_store(&self, name: &str) -> FolioResult<usize> {
        let (lease, project) = self.begin(name).await?;
        let state = project.state.read().await.clone();
        let mut index = project.memory.snapshot().await;
        let removed = index.clear();
        self.commit(project, lease, Staged::new(removed, state).with_index(index))
            .await
    }

    /// Stage, artifacts and chapter progress.
    ///
    /// # Errors
    ///
    /// `ProjectNotFound` and load failures.
    pub async fn project_status(&self, name: &str) -> FolioResult<ProjectStatus> {
        let project = self.require(name).await?;
        let state = project.state.read().await;
        Ok(ProjectStatus::from_state(&state, project.memory.len().await))
    }

    /// Plot threads.
    ///
    /// # Errors
    ///
    /// `ProjectNotFound` and load failures.
    pub async fn plot_arcs(&self, name: &str) -> FolioResult<PlotArcs> {
        let project = self.require(name).await?;
        let plot_arcs = project.state.read().await.plot_arcs.clone();
        Ok(plot_arcs)
    }

    /// Global summary log.
    ///
    /// # Errors
    ///
    /// `ProjectNotFound` and load failures.
    pub async fn global_summary(&self, name: &str) -> FolioResult<GlobalSummary> {
        let project = self.require(name).await?;
        let summary = project.state.read().await.global_summary.clone();
        Ok(summary)
    }

    /// Merged character state.
    ///
    /// # Errors
    ///
    /// `ProjectNotFound` and load failures.
    pub async fn character_state(&self, name: &str) -> FolioResult<CharacterState> {
        let project = self.require(name).await?;
        let characters = project.state.read().await.characters.clone();
        Ok(characters)
    }

    /// Full committed state of a project.
    ///
    /// # Errors
    ///
    /// `ProjectNotFound` and load failures.
    pub async fn project_state(&self, name: &str) -> FolioResult<ProjectState> {
        let project = self.require(name).await?;
        let state = project.state.read().await.clone();
        Ok(state)
    }

    /// Live vector memory records in insertion order.
    ///
    /// # Errors
    ///
    /// `ProjectNotFound` and load failures.
    pub async fn vector_records(&self, name: &str) -> FolioResult<Vec<VectorRecord>> {
        let project = self.require(name).await?;
        Ok(project.memory.records().await)
    }

    /// Providers, storage location and stored projects.
    ///
    /// # Errors
    ///
    /// Store listing failures.
    pub async fn health(&self) -> FolioResult<HealthReport> {
        Ok(HealthReport {
            llm_provider: self.llm.provider_name().to_string(),
            llm_model: self.llm.model_name().to_string(),
            embedding_provider: self.embedder.provider_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            store: self.store.location(),
            projects: self.store.list().await?,
        })
    }

    async fn begin(&self, name: &str) -> FolioResult<(ProjectLease, Arc<OpenProject>)> {
        Project::validate_name(name)?;
        let lease = self.locks.try_acquire(name)?;
        let project = self.require(name).await?;
        Ok((lease, project))
    }

    async fn require(&self, name: &str) -> FolioResult<Arc<OpenProject>> {
        self.find(name).await?.ok_or_else(|| {
            WorkspaceError::new(WorkspaceErrorKind::ProjectNotFound(name.to_string())).into()
        })
    }

    async fn find(&self, name: &str) -> FolioResult<Option<Arc<OpenProject>>> {
        Project::validate_name(name)?;
        if let Some(project) = self.open.read().await.get(name) {
            return Ok(Some(project.clone()));
        }
        let Some(stored) = self.store.load(name).await? else {
            return Ok(None);
        };
        debug!(project = name, records = stored.records.len(), "Opened stored project");
        let project = Arc::new(OpenProject::new(stored, self.embedder.clone()));
        let mut open = self.open.write().await;
        Ok(Some(open.entry(name.to_string()).or_insert(project).clone()))
    }

    /// Persist `staged`, then make it visible.
    ///
    /// Runs on its own task holding the lease, so the commit and the swap
    /// finish together even if the caller stops waiting.
    async fn commit<T: Send + 'static>(
        &self,
        project: Arc<OpenProject>,
        lease: ProjectLease,
        staged: Staged<T>,
    ) -> FolioResult<T> {
        let store = self.store.clone();
        let task = tokio::spawn(async move {
            let _lease = lease;
            let Staged {
                value,
                mut state,
                index,
            } = staged;
            state.bump_revision();
            let records = match &index {
                Some(index) => index.records().to_vec(),
                None => project.memory.records().await,
            };
            store
                .commit(&StoredProject {
                    state: state.clone(),
                    records,
                })
                .await?;

            let mut current = project.state.write().await;
            if let Some(index) = index {
                project.memory.install(index).await;
            }
            info!(
                project = state.name(),
                revision = state.project.revision(),
                stage = %state.stage(),
                "Committed"
            );
            *current = state;
            Ok::<_, FolioError>(value)
        });
        task.await.map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::CommitRejected(format!(
                "commit task failed: {e}"
            )))
        })?
    }
}
