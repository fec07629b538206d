//! Project identity and configuration snapshot.

use crate::Stage;
use chrono::{DateTime, Utc};
use folio_error::{FolioResult, WorkspaceError, WorkspaceErrorKind};
use serde::{Deserialize, Serialize};

/// Configuration captured when a project is created.
///
/// # Examples
///
/// ```
/// use folio_core::ProjectConfig;
///
/// let config = ProjectConfig::builder()
///     .topic("A lighthouse keeper finds a map")
///     .num_chapters(3u32)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.num_chapters(), 3);
/// assert_eq!(config.genre(), "Fantasy");
/// assert!(config.validate().is_ok());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into), default)]
pub struct ProjectConfig {
    /// Premise of the story
    #[serde(default = "default_topic")]
    topic: String,
    /// Genre label
    #[serde(default = "default_genre")]
    genre: String,
    /// Number of chapters in the blueprint
    #[serde(default = "default_num_chapters")]
    #[getter(copy)]
    num_chapters: u32,
    /// Target words per chapter
    #[serde(default = "default_words_per_chapter")]
    #[getter(copy)]
    words_per_chapter: u32,
    /// Free-form guidance applied to every stage
    #[serde(default)]
    user_guidance: String,
}

fn default_topic() -> String {
    "A grand adventure".to_string()
}

fn default_genre() -> String {
    "Fantasy".to_string()
}

fn default_num_chapters() -> u32 {
    10
}

fn default_words_per_chapter() -> u32 {
    3000
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            genre: default_genre(),
            num_chapters: default_num_chapters(),
            words_per_chapter: default_words_per_chapter(),
            user_guidance: String::new(),
        }
    }
}

impl ProjectConfig {
    /// Creates a new project config builder.
    pub fn builder() -> ProjectConfigBuilder {
        ProjectConfigBuilder::default()
    }

    /// Validates chapter count and length.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `num_chapters` or `words_per_chapter` is zero.
    pub fn validate(&self) -> FolioResult<()> {
        if self.num_chapters == 0 {
            return Err(WorkspaceError::new(WorkspaceErrorKind::InvalidInput(
                "num_chapters must be at least 1".to_string(),
            ))
            .into());
        }
        if self.words_per_chapter == 0 {
            return Err(WorkspaceError::new(WorkspaceErrorKind::InvalidInput(
                "words_per_chapter must be greater than 0".to_string(),
            ))
            .into());
        }
        Ok(())
    }
}

/// A project: identity, stage and configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Project {
    /// Unique name within the workspace
    name: String,
    /// Current lifecycle stage
    #[getter(copy)]
    stage: Stage,
    /// Configuration captured at creation
    config: ProjectConfig,
    /// Incremented on every committed mutation
    #[getter(copy)]
    revision: u64,
    /// Creation time
    #[getter(copy)]
    created_at: DateTime<Utc>,
    /// Time of the last committed mutation
    #[getter(copy)]
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new uninitialized project.
    pub fn new(name: impl Into<String>, config: ProjectConfig) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            stage: Stage::Uninitialized,
            config,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check that a name is usable as a single directory segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_core::Project;
    ///
    /// assert!(Project::validate_name("the-long-dark").is_ok());
    /// assert!(Project::validate_name("../escape").is_err());
    /// assert!(Project::validate_name("").is_err());
    /// ```
    pub fn validate_name(name: &str) -> FolioResult<()> {
        let valid = !name.trim().is_empty()
            && name != "."
            && name != ".."
            && !name.starts_with('.')
            && !name.contains(['/', '\\', '\0']);
        if valid {
            Ok(())
        } else {
            Err(WorkspaceError::new(WorkspaceErrorKind::InvalidProjectName(name.to_string())).into())
        }
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
        self.updated_at = Utc::now();
    }
}
