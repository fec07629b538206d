//! Filesystem project store with generation directories.

use crate::{ArtifactFile, assemble_artifacts, render_artifacts};
use async_trait::async_trait;
use folio_core::Project;
use folio_error::{FolioResult, PersistenceError, PersistenceErrorKind};
use folio_interface::{ProjectStore, StoredProject};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const CURRENT: &str = "CURRENT";
const MANIFEST: &str = "manifest.json";
const GENERATION_PREFIX: &str = "gen-";
const GENERATIONS_KEPT: usize = 2;

/// Filesystem project store.
///
/// # Example Structure
///
/// ```text
/// novel_projects/
/// └── lighthouse/
///     ├── CURRENT                  ("gen-000007")
///     ├── gen-000006/              (previous generation, kept)
///     └── gen-000007/
///         ├── manifest.json        (sha256 of every file below)
///         ├── project.json
///         ├── architecture.txt
///         ├── blueprint.json
///         ├── chapters/chapter_1_outline.txt
///         ├── chapters/chapter_1_draft.txt
///         ├── chapters/chapter_1_final.txt
///         ├── chapters/chapter_1.json
///         ├── global_summary.json
///         ├── character_state.json
///         ├── plot_arcs.json
///         └── vector_store/records.json
/// ```
///
/// A commit writes the new generation into a staging directory, renames it
/// into place, then replaces `CURRENT` with a temp file + rename. Until that
/// last rename succeeds, readers keep seeing the previous generation.
#[derive(Debug, Clone)]
pub struct FileSystemProjectStore {
    base_path: PathBuf,
}

fn write_error(path: &Path, e: std::io::Error) -> PersistenceError {
    PersistenceError::new(PersistenceErrorKind::FileWrite(format!(
        "{}: {}",
        path.display(),
        e
    )))
}

fn read_error(path: &Path, e: std::io::Error) -> PersistenceError {
    PersistenceError::new(PersistenceErrorKind::FileRead(format!(
        "{}: {}",
        path.display(),
        e
    )))
}

fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn generation_name(number: u64) -> String {
    format!("{GENERATION_PREFIX}{number:06}")
}

fn generation_number(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

impl FileSystemProjectStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> FolioResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Opened filesystem project store");
        Ok(Self { base_path })
    }

    /// Directory holding one project's generations.
    pub fn project_dir(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Path of the live generation directory, if any commit succeeded.
    pub async fn current_generation(&self, name: &str) -> FolioResult<Option<PathBuf>> {
        let dir = self.project_dir(name);
        let pointer = dir.join(CURRENT);
        match tokio::fs::read_to_string(&pointer).await {
            Ok(contents) => {
                let generation = contents.trim();
                if generation_number(generation).is_none() {
                    return Err(PersistenceError::new(PersistenceErrorKind::Corrupt(format!(
                        "{} names '{}'",
                        pointer.display(),
                        generation
                    )))
                    .into());
                }
                Ok(Some(dir.join(generation)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(read_error(&pointer, e).into()),
        }
    }

    async fn write_generation(&self, root: &Path, files: &[ArtifactFile]) -> FolioResult<()> {
        let mut manifest = BTreeMap::new();
        for file in files {
            let path = root.join(&file.path);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    PersistenceError::new(PersistenceErrorKind::DirectoryCreation(format!(
                        "{}: {}",
                        parent.display(),
                        e
                    )))
                })?;
            }
            tokio::fs::write(&path, &file.contents)
                .await
                .map_err(|e| write_error(&path, e))?;
            manifest.insert(file.path.clone(), compute_hash(&file.contents));
        }
        let manifest_bytes = serde_json::to_vec_pretty(&manifest).map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::Serialization(format!("{MANIFEST}: {e}")))
        })?;
        let manifest_path = root.join(MANIFEST);
        tokio::fs::write(&manifest_path, manifest_bytes)
            .await
            .map_err(|e| write_error(&manifest_path, e))?;
        Ok(())
    }

    async fn read_generation(&self, root: &Path) -> FolioResult<HashMap<String, Vec<u8>>> {
        let manifest_path = root.join(MANIFEST);
        let manifest_bytes = tokio::fs::read(&manifest_path)
            .await
            .map_err(|e| read_error(&manifest_path, e))?;
        let manifest: BTreeMap<String, String> =
            serde_json::from_slice(&manifest_bytes).map_err(|e| {
                PersistenceError::new(PersistenceErrorKind::Serialization(format!(
                    "{MANIFEST}: {e}"
                )))
            })?;

        let mut files = HashMap::new();
        for (relative, expected) in manifest {
            let path = root.join(&relative);
            let contents = tokio::fs::read(&path)
                .await
                .map_err(|e| read_error(&path, e))?;
            let actual = compute_hash(&contents);
            if actual != expected {
                return Err(PersistenceError::new(PersistenceErrorKind::Corrupt(format!(
                    "hash mismatch for {}: expected {}, got {}",
                    path.display(),
                    expected,
                    actual
                )))
                .into());
            }
            files.insert(relative, contents);
        }
        Ok(files)
    }

    async fn generations(&self, dir: &Path) -> Vec<(u64, PathBuf)> {
        let mut found = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return found;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if let Some(number) = name.to_str().and_then(generation_number) {
                found.push((number, entry.path()));
            }
        }
        found.sort();
        found
    }

    async fn prune(&self, dir: &Path) {
        let generations = self.generations(dir).await;
        let excess = generations.len().saturating_sub(GENERATIONS_KEPT);
        for (_, path) in generations.into_iter().take(excess) {
            if let Err(e) = tokio::fs::remove_dir_all(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to prune old generation");
            }
        }
    }
}

#[async_trait]
impl ProjectStore for FileSystemProjectStore {
    #[tracing::instrument(skip(self))]
    async fn load(&self, name: &str) -> FolioResult<Option<StoredProject>> {
        Project::validate_name(name)?;
        let Some(root) = self.current_generation(name).await? else {
            return Ok(None);
        };
        let files = self.read_generation(&root).await?;
        let snapshot = assemble_artifacts(&files)?;
        if snapshot.state.name() != name {
            return Err(PersistenceError::new(PersistenceErrorKind::Corrupt(format!(
                "directory '{}' holds project '{}'",
                name,
                snapshot.state.name()
            )))
            .into());
        }
        tracing::debug!(
            project = name,
            generation = %root.display(),
            records = snapshot.records.len(),
            "Loaded project"
        );
        Ok(Some(snapshot))
    }

    #[tracing::instrument(
        skip(self, snapshot),
        fields(project = %snapshot.state.name(), revision = snapshot.state.project.revision())
    )]
    async fn commit(&self, snapshot: &StoredProject) -> FolioResult<()> {
        let name = snapshot.state.name();
        Project::validate_name(name)?;
        let files = render_artifacts(snapshot)?;

        let dir = self.project_dir(name);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::DirectoryCreation(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })?;

        let next = self
            .generations(&dir)
            .await
            .last()
            .map(|(number, _)| number + 1)
            .unwrap_or(1);
        let generation = generation_name(next);
        let staging = dir.join(format!(".staging-{}", Uuid::new_v4()));

        if let Err(e) = self.write_generation(&staging, &files).await {
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        let target = dir.join(&generation);
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(write_error(&target, e).into());
        }

        // Switching CURRENT is the commit point.
        let pointer = dir.join(CURRENT);
        let temp_pointer = dir.join(format!("{CURRENT}.tmp"));
        let switched = async {
            tokio::fs::write(&temp_pointer, generation.as_bytes())
                .await
                .map_err(|e| write_error(&temp_pointer, e))?;
            tokio::fs::rename(&temp_pointer, &pointer)
                .await
                .map_err(|e| write_error(&pointer, e))
        }
        .await;
        if let Err(e) = switched {
            let _ = tokio::fs::remove_dir_all(&target).await;
            return Err(e.into());
        }

        tracing::info!(
            project = name,
            generation = %generation,
            files = files.len(),
            records = snapshot.records.len(),
            "Committed project generation"
        );

        self.prune(&dir).await;
        Ok(())
    }

    async fn list(&self) -> FolioResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.base_path)
            .await
            .map_err(|e| read_error(&self.base_path, e))?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| read_error(&self.base_path, e))?
        {
            let has_pointer = tokio::fs::try_exists(entry.path().join(CURRENT))
                .await
                .unwrap_or(false);
            if has_pointer {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn location(&self) -> String {
        self.base_path.display().to_string()
    }
}
