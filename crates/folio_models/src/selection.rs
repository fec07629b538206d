//! Provider settings and selection.

use crate::{HashingEmbedder, OpenAiCompatibleClient, OpenAiEmbeddingClient};
use folio_error::{ConfigError, FolioResult};
use folio_interface::{EmbeddingProvider, LlmProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Supported language-model backends.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LlmProviderKind {
    /// OpenAI or any `/chat/completions` compatible gateway
    #[default]
    OpenAi,
}

/// Supported embedding backends.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI or any `/embeddings` compatible gateway
    #[default]
    OpenAi,
    /// Offline feature hashing
    Hashing,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_dimensions() -> usize {
    crate::hashing::DEFAULT_DIMENSIONS
}

/// Resolve the key from the literal setting or the named environment variable.
fn resolve_api_key(api_key: Option<&str>, api_key_env: &str) -> Option<String> {
    api_key
        .map(str::to_string)
        .or_else(|| std::env::var(api_key_env).ok())
        .filter(|key| !key.trim().is_empty())
}

fn require(problems: &mut Vec<String>, ok: bool, message: impl Into<String>) {
    if !ok {
        problems.push(message.into());
    }
}

fn finish(section: &str, problems: Vec<String>) -> FolioResult<()> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::new(format!(
            "invalid [{section}] settings: {}",
            problems.join("; ")
        ))
        .into())
    }
}

/// `[llm]` configuration section.
///
/// # Examples
///
/// ```
/// use folio_models::LlmSettings;
///
/// let settings = LlmSettings::builder()
///     .api_key(Some("sk-test".to_string()))
///     .model("gpt-4o")
///     .build()
///     .unwrap();
/// assert!(settings.validate().is_ok());
/// assert_eq!(settings.base_url(), "https://api.openai.com/v1");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct LlmSettings {
    /// Backend
    #[serde(default)]
    #[builder(default)]
    #[getter(copy)]
    provider: LlmProviderKind,
    /// API root, e.g. `https://api.openai.com/v1`
    #[serde(default = "default_base_url")]
    #[builder(default = "default_base_url()")]
    base_url: String,
    /// Literal API key
    #[serde(default)]
    #[builder(default)]
    api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset
    #[serde(default = "default_api_key_env")]
    #[builder(default = "default_api_key_env()")]
    api_key_env: String,
    /// Model identifier
    #[serde(default = "default_llm_model")]
    #[builder(default = "default_llm_model()")]
    model: String,
    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    #[builder(default = "default_temperature()")]
    #[getter(copy)]
    temperature: f32,
    /// Default completion token cap
    #[serde(default = "default_max_tokens")]
    #[builder(default = "default_max_tokens()")]
    #[getter(copy)]
    max_tokens: u32,
    /// HTTP timeout per request
    #[serde(default = "default_timeout_secs")]
    #[builder(default = "default_timeout_secs()")]
    #[getter(copy)]
    timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmSettings {
    /// Creates a new builder for `LlmSettings`.
    pub fn builder() -> LlmSettingsBuilder {
        LlmSettingsBuilder::default()
    }

    /// API key from the setting or its environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), &self.api_key_env)
    }

    /// Check every required key and report all problems at once.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming each missing or out-of-range key.
    pub fn validate(&self) -> FolioResult<()> {
        let mut problems = Vec::new();
        require(
            &mut problems,
            self.resolved_api_key().is_some(),
            format!("llm.api_key is missing (and ${} is unset)", self.api_key_env),
        );
        require(&mut problems, !self.model.trim().is_empty(), "llm.model is empty");
        require(
            &mut problems,
            !self.base_url.trim().is_empty(),
            "llm.base_url is empty",
        );
        require(
            &mut problems,
            (0.0..=2.0).contains(&self.temperature),
            format!("llm.temperature {} is outside [0, 2]", self.temperature),
        );
        require(&mut problems, self.max_tokens > 0, "llm.max_tokens must be positive");
        require(
            &mut problems,
            self.timeout_secs > 0,
            "llm.timeout_secs must be positive",
        );
        finish("llm", problems)
    }
}

/// `[embedding]` configuration section.
///
/// # Examples
///
/// ```
/// use folio_models::{EmbeddingProviderKind, EmbeddingSettings};
///
/// let settings = EmbeddingSettings::builder()
///     .provider(EmbeddingProviderKind::Hashing)
///     .build()
///     .unwrap();
/// assert!(settings.validate().is_ok());
/// assert_eq!(settings.dimensions(), 256);
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
#[builder(setter(into))]
pub struct EmbeddingSettings {
    /// Backend
    #[serde(default)]
    #[builder(default)]
    #[getter(copy)]
    provider: EmbeddingProviderKind,
    /// API root
    #[serde(default = "default_base_url")]
    #[builder(default = "default_base_url()")]
    base_url: String,
    /// Literal API key
    #[serde(default)]
    #[builder(default)]
    api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset
    #[serde(default = "default_api_key_env")]
    #[builder(default = "default_api_key_env()")]
    api_key_env: String,
    /// Model identifier
    #[serde(default = "default_embedding_model")]
    #[builder(default = "default_embedding_model()")]
    model: String,
    /// Vector width for the hashing embedder
    #[serde(default = "default_dimensions")]
    #[builder(default = "default_dimensions()")]
    #[getter(copy)]
    dimensions: usize,
    /// HTTP timeout per request
    #[serde(default = "default_timeout_secs")]
    #[builder(default = "default_timeout_secs()")]
    #[getter(copy)]
    timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingSettings {
    /// Creates a new builder for `EmbeddingSettings`.
    pub fn builder() -> EmbeddingSettingsBuilder {
        EmbeddingSettingsBuilder::default()
    }

    /// API key from the setting or its environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), &self.api_key_env)
    }

    /// Check every required key for the selected backend.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming each missing or out-of-range key.
    pub fn validate(&self) -> FolioResult<()> {
        let mut problems = Vec::new();
        match self.provider {
            EmbeddingProviderKind::Hashing => {
                require(
                    &mut problems,
                    self.dimensions > 0,
                    "embedding.dimensions must be positive",
                );
            }
            EmbeddingProviderKind::OpenAi => {
                require(
                    &mut problems,
                    self.resolved_api_key().is_some(),
                    format!(
                        "embedding.api_key is missing (and ${} is unset)",
                        self.api_key_env
                    ),
                );
                require(
                    &mut problems,
                    !self.model.trim().is_empty(),
                    "embedding.model is empty",
                );
                require(
                    &mut problems,
                    !self.base_url.trim().is_empty(),
                    "embedding.base_url is empty",
                );
                require(
                    &mut problems,
                    self.timeout_secs > 0,
                    "embedding.timeout_secs must be positive",
                );
            }
        }
        finish("embedding", problems)
    }
}

/// Resolve `[llm]` settings into a provider.
///
/// # Errors
///
/// Returns a `ConfigError` when settings are invalid.
#[instrument(skip(settings), fields(provider = %settings.provider(), model = %settings.model()))]
pub fn build_llm(settings: &LlmSettings) -> FolioResult<Arc<dyn LlmProvider>> {
    settings.validate()?;
    let api_key = settings.resolved_api_key().unwrap_or_default();
    let provider: Arc<dyn LlmProvider> = match settings.provider() {
        LlmProviderKind::OpenAi => Arc::new(
            OpenAiCompatibleClient::new(
                api_key,
                settings.base_url().clone(),
                settings.model().clone(),
                Duration::from_secs(settings.timeout_secs()),
            )?
            .with_temperature(settings.temperature())
            .with_max_tokens(settings.max_tokens()),
        ),
    };
    info!("Language model provider ready");
    Ok(provider)
}

/// Resolve `[embedding]` settings into a provider.
///
/// # Errors
///
/// Returns a `ConfigError` when settings are invalid.
#[instrument(skip(settings), fields(provider = %settings.provider()))]
pub fn build_embedder(settings: &EmbeddingSettings) -> FolioResult<Arc<dyn EmbeddingProvider>> {
    settings.validate()?;
    let provider: Arc<dyn EmbeddingProvider> = match settings.provider() {
        EmbeddingProviderKind::Hashing => Arc::new(HashingEmbedder::new(settings.dimensions())),
        EmbeddingProviderKind::OpenAi => Arc::new(OpenAiEmbeddingClient::new(
            settings.resolved_api_key().unwrap_or_default(),
            settings.base_url().clone(),
            settings.model().clone(),
            Duration::from_secs(settings.timeout_secs()),
        )?),
    };
    info!("Embedding provider ready");
    Ok(provider)
}
