use async_trait::async_trait;
use folio_core::GenerationConfig;
use folio_error::{FolioResult, ProviderError, ProviderErrorKind, WorkspaceError, WorkspaceErrorKind};
use folio_interface::{EmbeddingProvider, LlmProvider};
use folio_retry::{ResilientEmbedder, ResilientLlm, RetryPolicy, with_retry};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn quick_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .initial_backoff_ms(2u64)
        .max_backoff_ms(10u64)
        .attempt_timeout_ms(200u64)
        .build()
        .unwrap()
}

/// LLM that replays a script of results, one per call.
struct ScriptedLlm {
    script: Mutex<VecDeque<FolioResult<String>>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(script: Vec<FolioResult<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, _prompt: &str, _config: &GenerationConfig) -> FolioResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("exhausted".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "script-1"
    }
}

fn provider_err(kind: ProviderErrorKind) -> FolioResult<String> {
    Err(ProviderError::new(kind).into())
}

#[tokio::test]
async fn test_network_errors_are_retried_until_success() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        provider_err(ProviderErrorKind::NetworkError("reset".into())),
        provider_err(ProviderErrorKind::RateLimited {
            message: "slow".into(),
            retry_after_secs: None,
        }),
        Ok("third time".into()),
    ]));
    let resilient = ResilientLlm::new(llm.clone(), quick_policy());

    let text = resilient
        .complete("prompt", &GenerationConfig::for_task("test"))
        .await
        .unwrap();

    assert_eq!(text, "third time");
    assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_gives_up_after_three_attempts() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        provider_err(ProviderErrorKind::NetworkError("one".into())),
        provider_err(ProviderErrorKind::NetworkError("two".into())),
        provider_err(ProviderErrorKind::NetworkError("three".into())),
        Ok("never reached".into()),
    ]));
    let resilient = ResilientLlm::new(llm.clone(), quick_policy());

    let err = resilient
        .complete("prompt", &GenerationConfig::for_task("test"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "network_error");
    assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_auth_and_malformed_are_not_retried() {
    for kind in [
        ProviderErrorKind::AuthError("bad key".into()),
        ProviderErrorKind::MalformedResponse("garbage".into()),
    ] {
        let llm = Arc::new(ScriptedLlm::new(vec![provider_err(kind), Ok("unused".into())]));
        let resilient = ResilientLlm::new(llm.clone(), quick_policy());

        let err = resilient
            .complete("prompt", &GenerationConfig::for_task("test"))
            .await
            .unwrap_err();

        assert!(matches!(err.code(), "auth_error" | "malformed_response"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_non_provider_errors_fail_immediately() {
    let calls = AtomicUsize::new(0);
    let result: FolioResult<()> = with_retry(&quick_policy(), "local", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(WorkspaceError::new(WorkspaceErrorKind::InvalidInput("nope".into())).into()) }
    })
    .await;

    assert_eq!(result.unwrap_err().code(), "invalid_input");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Embedder that hangs on its first call.
struct SlowThenFastEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for SlowThenFastEmbedder {
    async fn embed(&self, _text: &str) -> FolioResult<Vec<f32>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        Ok(vec![1.0, 0.0])
    }

    fn provider_name(&self) -> &'static str {
        "slow"
    }

    fn model_name(&self) -> &str {
        "slow-1"
    }
}

#[tokio::test]
async fn test_timed_out_attempt_counts_as_network_error_and_retries() {
    let embedder = Arc::new(SlowThenFastEmbedder {
        calls: AtomicUsize::new(0),
    });
    let policy = RetryPolicy::builder()
        .initial_backoff_ms(2u64)
        .attempt_timeout_ms(20u64)
        .build()
        .unwrap();
    let resilient = ResilientEmbedder::new(embedder.clone(), policy);

    let vector = resilient.embed("text").await.unwrap();

    assert_eq!(vector, vec![1.0, 0.0]);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
}
