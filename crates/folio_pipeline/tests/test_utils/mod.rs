//! Fake providers and stores for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use folio_core::{GenerationConfig, PipelineSettings, ProjectConfig};
use folio_error::{
    FolioResult, PersistenceError, PersistenceErrorKind, ProviderError, ProviderErrorKind,
};
use folio_interface::{EmbeddingProvider, LlmProvider, ProjectStore, StoredProject};
use folio_models::HashingEmbedder;
use folio_pipeline::Workspace;
use folio_retry::RetryPolicy;
use folio_storage::InMemoryProjectStore;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const ARCHITECTURE: &str = "Mara Vell keeps the lighthouse on the island of Skerry. \
    The lamp holds back a drowned sea. Her brother Tomas sailed away ten years ago.";

pub const OUTLINE: &str = "1. The storm rises.\n2. The lamp falters.\n3. Mara relights it.";

pub const DRAFT: &str = "Mara climbed the tower as the storm broke over Skerry. \
    The lamp guttered, and she relit it with her last dry match.";

pub const FINALIZATION: &str = r#"```json
{
  "summary": "Mara keeps the lamp burning through the storm.",
  "characters": {
    "Mara": {"attributes": {"eyes": "grey", "role": "lighthouse keeper"}, "arc_position": "steadfast"}
  },
  "new_threads": ["Where did Tomas sail?"],
  "resolved_threads": []
}
```"#;

pub const CLEAN_CHECK: &str = r#"{"contradictions": []}"#;

pub fn blueprint_json(chapters: u32) -> String {
    let specs: Vec<String> = (1..=chapters)
        .map(|i| match i {
            1 => r#"{"index": 1, "title": "The Lamp", "synopsis": "Mara tends the failing lamp during a storm."}"#.to_string(),
            2 => r#"{"index": 2, "title": "The Letter", "synopsis": "A letter from Tomas reaches Mara after the storm at the lamp."}"#.to_string(),
            3 => r#"{"index": 3, "title": "The Return", "synopsis": "Tomas returns to Skerry by boat."}"#.to_string(),
            n => format!(r#"{{"index": {n}, "title": "Chapter {n}", "synopsis": "Events continue."}}"#),
        })
        .collect();
    format!("Here is the plan:\n[{}]", specs.join(",\n"))
}

/// Language model that answers by task label.
///
/// Queued responses for a label are used first, then the label's default.
pub struct ScriptedLlm {
    queued: Mutex<HashMap<String, VecDeque<FolioResult<String>>>>,
    defaults: Mutex<HashMap<String, String>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedLlm {
    pub fn new(chapters: u32) -> Self {
        let defaults = [
            ("architecture", ARCHITECTURE.to_string()),
            ("blueprint", blueprint_json(chapters)),
            ("chapter_outline", OUTLINE.to_string()),
            ("chapter_draft", DRAFT.to_string()),
            ("finalization", FINALIZATION.to_string()),
            ("consistency", CLEAN_CHECK.to_string()),
        ]
        .into_iter()
        .map(|(label, text)| (label.to_string(), text))
        .collect();
        Self {
            queued: Mutex::new(HashMap::new()),
            defaults: Mutex::new(defaults),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, label: &str, response: FolioResult<String>) {
        self.queued
            .lock()
            .unwrap()
            .entry(label.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn set_default(&self, label: &str, text: &str) {
        self.defaults
            .lock()
            .unwrap()
            .insert(label.to_string(), text.to_string());
    }

    pub fn prompts_for(&self, label: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| l == label)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    pub fn calls(&self, label: &str) -> usize {
        self.prompts_for(label).len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> FolioResult<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((config.label.clone(), prompt.to_string()));
        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&config.label)
            .and_then(VecDeque::pop_front);
        if let Some(response) = queued {
            return response;
        }
        self.defaults
            .lock()
            .unwrap()
            .get(&config.label)
            .cloned()
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::MalformedResponse(format!(
                    "no script for {}",
                    config.label
                )))
                .into()
            })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-v1"
    }
}

/// Language model that parks every call until released.
pub struct GatedLlm {
    inner: ScriptedLlm,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedLlm {
    pub fn new(chapters: u32) -> Self {
        Self {
            inner: ScriptedLlm::new(chapters),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for GatedLlm {
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> FolioResult<String> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.complete(prompt, config).await
    }

    fn provider_name(&self) -> &'static str {
        "gated"
    }

    fn model_name(&self) -> &str {
        "gated-v1"
    }
}

/// Hashing embedder that can be switched to fail.
#[derive(Default)]
pub struct SwitchableEmbedder {
    inner: HashingEmbedder,
    pub failing: AtomicBool,
    inputs: Mutex<Vec<usize>>,
}

impl SwitchableEmbedder {
    /// Character counts of every text embedded so far.
    pub fn input_lengths(&self) -> Vec<usize> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn forget_inputs(&self) {
        self.inputs.lock().unwrap().clear();
    }
}

#[async_trait]
impl EmbeddingProvider for SwitchableEmbedder {
    async fn embed(&self, text: &str) -> FolioResult<Vec<f32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::new(ProviderErrorKind::AuthError(
                "embedding key revoked".to_string(),
            ))
            .into());
        }
        self.inputs.lock().unwrap().push(text.chars().count());
        self.inner.embed(text).await
    }

    fn provider_name(&self) -> &'static str {
        "switchable"
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

/// In-memory store whose commits can be switched to fail.
#[derive(Default)]
pub struct SwitchableStore {
    inner: InMemoryProjectStore,
    pub failing: AtomicBool,
}

#[async_trait]
impl ProjectStore for SwitchableStore {
    async fn load(&self, name: &str) -> FolioResult<Option<StoredProject>> {
        self.inner.load(name).await
    }

    async fn commit(&self, snapshot: &StoredProject) -> FolioResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::new(PersistenceErrorKind::FileWrite(
                "disk full".to_string(),
            ))
            .into());
        }
        self.inner.commit(snapshot).await
    }

    async fn list(&self) -> FolioResult<Vec<String>> {
        self.inner.list().await
    }

    fn location(&self) -> String {
        "switchable".to_string()
    }
}

pub fn quick_retry() -> RetryPolicy {
    RetryPolicy::builder()
        .initial_backoff_ms(1u64)
        .max_backoff_ms(4u64)
        .attempt_timeout_ms(5_000u64)
        .build()
        .unwrap()
}

pub fn three_chapters() -> ProjectConfig {
    ProjectConfig::builder()
        .topic("A keeper and a drowned sea")
        .num_chapters(3u32)
        .words_per_chapter(800u32)
        .build()
        .unwrap()
}

pub struct Harness {
    pub workspace: Arc<Workspace>,
    pub llm: Arc<ScriptedLlm>,
    pub embedder: Arc<SwitchableEmbedder>,
    pub store: Arc<SwitchableStore>,
}

pub fn harness() -> Harness {
    let llm = Arc::new(ScriptedLlm::new(3));
    let embedder = Arc::new(SwitchableEmbedder::default());
    let store = Arc::new(SwitchableStore::default());
    let workspace = Arc::new(Workspace::new(
        store.clone(),
        llm.clone(),
        embedder.clone(),
        PipelineSettings::default(),
        quick_retry(),
    ));
    Harness {
        workspace,
        llm,
        embedder,
        store,
    }
}

/// A fresh workspace over the same store, with nothing cached.
pub fn reopen(harness: &Harness) -> Workspace {
    Workspace::new(
        harness.store.clone(),
        harness.llm.clone(),
        harness.embedder.clone(),
        PipelineSettings::default(),
        quick_retry(),
    )
}
