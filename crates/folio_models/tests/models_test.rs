use folio_error::ProviderErrorKind;
use folio_interface::{EmbeddingProvider, LlmProvider};
use folio_models::{
    ChatMessage, ChatRequest, EmbeddingProviderKind, EmbeddingSettings, HashingEmbedder, LlmSettings,
    build_embedder, build_llm, classify_response,
};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn test_status_classification() {
    assert!(matches!(
        classify_response(401, None, "bad key").kind,
        ProviderErrorKind::AuthError(_)
    ));
    assert!(matches!(
        classify_response(403, None, "forbidden").kind,
        ProviderErrorKind::AuthError(_)
    ));
    assert!(matches!(
        classify_response(502, None, "gateway").kind,
        ProviderErrorKind::NetworkError(_)
    ));
    assert!(matches!(
        classify_response(429, Some(12), "slow down").kind,
        ProviderErrorKind::RateLimited {
            retry_after_secs: Some(12),
            ..
        }
    ));
    assert!(matches!(
        classify_response(422, None, "unprocessable").kind,
        ProviderErrorKind::MalformedResponse(_)
    ));
}

#[tokio::test]
async fn test_hashing_embedder_is_deterministic() {
    let embedder = HashingEmbedder::new(128);
    let first = embedder.embed("The keeper trims the wick at dusk").await.unwrap();
    let second = embedder.embed("The keeper trims the wick at dusk").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(embedder.provider_name(), "hashing");
}

#[tokio::test]
async fn test_hashing_embedder_ranks_shared_vocabulary_higher() {
    let embedder = HashingEmbedder::default();
    let query = embedder.embed("lighthouse keeper storm").await.unwrap();
    let related = embedder
        .embed("The lighthouse keeper watched the storm roll in")
        .await
        .unwrap();
    let unrelated = embedder
        .embed("A merchant counted coins in the bazaar")
        .await
        .unwrap();
    assert!(cosine(&query, &related) > cosine(&query, &unrelated));
}

#[tokio::test]
async fn test_hashing_embedder_rejects_blank_text() {
    let err = HashingEmbedder::default().embed("   ").await.unwrap_err();
    assert_eq!(err.code(), "malformed_response");
}

#[test]
fn test_llm_settings_report_every_problem() {
    let settings = LlmSettings::builder()
        .api_key_env("FOLIO_TEST_KEY_THAT_IS_NEVER_SET")
        .model("")
        .temperature(3.5f32)
        .max_tokens(0u32)
        .build()
        .unwrap();

    let err = settings.validate().unwrap_err();
    let message = err.to_string();
    assert_eq!(err.code(), "config_error");
    assert!(message.contains("llm.api_key"));
    assert!(message.contains("llm.model"));
    assert!(message.contains("llm.temperature"));
    assert!(message.contains("llm.max_tokens"));
    assert!(build_llm(&settings).is_err());
}

#[test]
fn test_llm_settings_build_provider() {
    let settings = LlmSettings::builder()
        .api_key(Some("sk-test".to_string()))
        .model("local-model")
        .base_url("http://localhost:11434/v1")
        .build()
        .unwrap();
    let llm = build_llm(&settings).unwrap();
    assert_eq!(llm.provider_name(), "openai");
    assert_eq!(llm.model_name(), "local-model");
}

#[test]
fn test_embedding_settings_select_backend() {
    let hashing = EmbeddingSettings::builder()
        .provider(EmbeddingProviderKind::Hashing)
        .dimensions(64usize)
        .build()
        .unwrap();
    assert_eq!(build_embedder(&hashing).unwrap().provider_name(), "hashing");

    let openai = EmbeddingSettings::builder()
        .api_key_env("FOLIO_TEST_KEY_THAT_IS_NEVER_SET")
        .build()
        .unwrap();
    let err = openai.validate().unwrap_err();
    assert!(err.to_string().contains("embedding.api_key"));
}

#[test]
fn test_settings_deserialize_with_defaults() {
    let settings: EmbeddingSettings =
        serde_json::from_str(r#"{"provider": "hashing", "dimensions": 32}"#).unwrap();
    assert_eq!(settings.provider(), EmbeddingProviderKind::Hashing);
    assert_eq!(settings.dimensions(), 32);
    assert_eq!(settings.model(), "text-embedding-3-small");
}

#[test]
fn test_chat_request_omits_unset_overrides() {
    let request = ChatRequest::builder()
        .model("gpt-4o-mini")
        .messages(vec![ChatMessage {
            role: "user".to_string(),
            content: "Outline chapter one.".to_string(),
        }])
        .build()
        .unwrap();
    let json = serde_json::to_value(&request).unwrap();
    assert!(json.get("temperature").is_none());
    assert!(json.get("max_tokens").is_none());
}
