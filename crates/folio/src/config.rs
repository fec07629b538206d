//! Layered application configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Bundled defaults (`folio.toml` shipped with the crate)
//! 2. `~/.config/folio/folio.toml`
//! 3. `./folio.toml`, or the file passed with `--config`
//! 4. `FOLIO__<SECTION>__<KEY>` environment variables

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use folio_core::{PipelineSettings, ProjectConfig};
use folio_error::{ConfigError, FolioError, FolioErrorKind, FolioResult};
use folio_models::{EmbeddingSettings, LlmSettings, build_embedder, build_llm};
use folio_pipeline::Workspace;
use folio_retry::RetryPolicy;
use folio_storage::FileSystemProjectStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../folio.toml");

/// `[workspace]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct WorkspaceSettings {
    /// Directory holding one subdirectory per project
    #[serde(default = "default_projects_dir")]
    projects_dir: PathBuf,
}

fn default_projects_dir() -> PathBuf {
    PathBuf::from("novel_projects")
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
        }
    }
}

/// Complete application configuration.
///
/// # Examples
///
/// ```
/// use folio::FolioConfig;
///
/// let config = FolioConfig::default();
/// assert_eq!(config.prompt().retrieval_k(), 4);
/// assert_eq!(config.defaults().num_chapters(), 10);
/// ```
#[derive(
    Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct FolioConfig {
    /// Project storage
    #[serde(default)]
    workspace: WorkspaceSettings,
    /// Language-model provider
    #[serde(default)]
    llm: LlmSettings,
    /// Embedding provider
    #[serde(default)]
    embedding: EmbeddingSettings,
    /// Provider call retries
    #[serde(default)]
    retry: RetryPolicy,
    /// Retrieval and prompt budgets
    #[serde(default)]
    prompt: PipelineSettings,
    /// Configuration for newly created projects
    #[serde(default)]
    defaults: ProjectConfig,
}

impl FolioConfig {
    /// Load configuration from every standard source.
    ///
    /// A `.env` file in the working directory is read first so provider
    /// keys may live there.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a source cannot be read or parsed.
    #[instrument]
    pub fn load() -> FolioResult<Self> {
        Self::load_with(None)
    }

    /// Load configuration, replacing `./folio.toml` with `path` when given.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a source cannot be read or parsed, or if
    /// `path` does not exist.
    #[instrument(skip(path))]
    pub fn load_with(path: Option<&Path>) -> FolioResult<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "Loaded .env");
        }

        let mut builder = bundled();
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/folio/folio.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }
        builder = match path {
            Some(path) => builder.add_source(File::from(path).format(FileFormat::Toml)),
            None => builder.add_source(File::with_name("folio").required(false)),
        };
        builder = builder.add_source(
            Environment::with_prefix("FOLIO")
                .separator("__")
                .try_parsing(true),
        );
        finish(builder)
    }

    /// Load the bundled defaults overlaid with a single file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> FolioResult<Self> {
        let builder = bundled().add_source(File::from(path.as_ref()).format(FileFormat::Toml));
        finish(builder)
    }

    /// Check the provider sections and project defaults together.
    ///
    /// # Errors
    ///
    /// Returns one `ConfigError` listing every problem found.
    pub fn validate(&self) -> FolioResult<()> {
        let problems: Vec<String> = [
            self.llm.validate(),
            self.embedding.validate(),
            self.defaults.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .map(|e| problem(&e))
        .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(problems.join("; ")).into())
        }
    }

    /// Resolve providers and storage into a ready workspace.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for invalid settings, or a persistence error
    /// if the projects directory cannot be created.
    #[instrument(skip(self), fields(projects_dir = %self.workspace.projects_dir.display()))]
    pub fn build_workspace(&self) -> FolioResult<Workspace> {
        self.validate()?;
        let llm = build_llm(&self.llm)?;
        let embedder = build_embedder(&self.embedding)?;
        let store = FileSystemProjectStore::new(self.workspace.projects_dir.clone())?;
        info!("Workspace ready");
        Ok(Workspace::new(
            Arc::new(store),
            llm,
            embedder,
            self.prompt.clone(),
            self.retry.clone(),
        ))
    }
}

fn bundled() -> ConfigBuilder<DefaultState> {
    Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> FolioResult<FolioConfig> {
    builder
        .build()
        .map_err(|e| {
            FolioError::from(ConfigError::new(format!(
                "Failed to build configuration: {}",
                e
            )))
        })?
        .try_deserialize()
        .map_err(|e| {
            FolioError::from(ConfigError::new(format!(
                "Failed to parse configuration: {}",
                e
            )))
        })
}

fn problem(error: &FolioError) -> String {
    match error.kind() {
        FolioErrorKind::Config(config) => config.message.clone(),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_parse() {
        let config = finish(bundled()).unwrap();
        assert_eq!(config.workspace().projects_dir(), Path::new("novel_projects"));
        assert_eq!(config.llm().model(), "gpt-4o-mini");
        assert_eq!(config.retry().max_attempts(), 3);
        assert_eq!(config.prompt().chunk_chars(), 1200);
        assert_eq!(config.defaults().genre(), "Fantasy");
    }

    #[test]
    fn test_bundled_defaults_match_code_defaults() {
        assert_eq!(finish(bundled()).unwrap(), FolioConfig::default());
    }
}
