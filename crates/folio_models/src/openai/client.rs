//! OpenAI-compatible chat and embedding clients.

use super::dto::{ChatMessage, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse};
use async_trait::async_trait;
use folio_core::GenerationConfig;
use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use folio_interface::{EmbeddingProvider, LlmProvider};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str =
    "You are a careful novelist's assistant. Follow the requested output format exactly.";

/// Map a non-success HTTP response to a provider error.
///
/// # Examples
///
/// ```
/// use folio_error::ProviderErrorKind;
/// use folio_models::classify_response;
///
/// let err = classify_response(429, Some(7), "quota");
/// assert_eq!(
///     err.kind,
///     ProviderErrorKind::RateLimited { message: "quota".into(), retry_after_secs: Some(7) }
/// );
/// assert!(matches!(classify_response(400, None, "bad").kind, ProviderErrorKind::MalformedResponse(_)));
/// ```
#[track_caller]
pub fn classify_response(status: u16, retry_after_secs: Option<u64>, body: &str) -> ProviderError {
    let kind = match ProviderErrorKind::from_status(status, body) {
        ProviderErrorKind::RateLimited { message, .. } => ProviderErrorKind::RateLimited {
            message,
            retry_after_secs,
        },
        other => other,
    };
    ProviderError::new(kind)
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_decode() {
        ProviderError::new(ProviderErrorKind::MalformedResponse(format!(
            "Failed to parse response: {e}"
        )))
    } else {
        ProviderError::new(ProviderErrorKind::NetworkError(format!("Request failed: {e}")))
    }
}

async fn check_status(response: Response) -> FolioResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    Err(classify_response(status, retry_after, &body).into())
}

fn http_client(timeout: Duration) -> FolioResult<Client> {
    Client::builder().timeout(timeout).build().map_err(|e| {
        ProviderError::new(ProviderErrorKind::NetworkError(format!(
            "Failed to build HTTP client: {e}"
        )))
        .into()
    })
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Chat completion client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAiCompatibleClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    #[instrument(skip(api_key))]
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> FolioResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            base_url,
            model,
            temperature: None,
            max_tokens: None,
        })
    }

    /// Default sampling temperature when a call does not override it.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Default completion token cap when a call does not override it.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Request body for a prompt under `config`.
    pub fn request_for(&self, prompt: &str, config: &GenerationConfig) -> ChatRequest {
        ChatRequest {
            model: config.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: config.temperature.or(self.temperature),
            max_tokens: config.max_tokens.or(self.max_tokens),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleClient {
    #[instrument(skip(self, prompt, config), fields(model = %self.model, label = %config.label))]
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> FolioResult<String> {
        let url = endpoint(&self.base_url, "chat/completions");
        debug!(url = %url, prompt_chars = prompt.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_for(prompt, config))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        let body: ChatResponse = response.json().await.map_err(transport_error)?;
        body.first_text().map(str::to_string).ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::MalformedResponse(
                "completion contained no text".to_string(),
            ))
            .into()
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Embedding client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiEmbeddingClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    #[instrument(skip(api_key))]
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> FolioResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            base_url,
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingClient {
    #[instrument(skip(self, text), fields(model = %self.model, text_chars = text.len()))]
    async fn embed(&self, text: &str) -> FolioResult<Vec<f32>> {
        let url = endpoint(&self.base_url, "embeddings");
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        let body: EmbeddingResponse = response.json().await.map_err(transport_error)?;
        body.data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::MalformedResponse(
                    "embedding response contained no vector".to_string(),
                ))
                .into()
            })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("https://api.example.com/v1/", "embeddings"),
            "https://api.example.com/v1/embeddings"
        );
    }

    #[test]
    fn test_call_overrides_take_precedence() {
        let client = OpenAiCompatibleClient::new(
            "key".into(),
            "https://api.example.com/v1".into(),
            "base-model".into(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_temperature(0.7)
        .with_max_tokens(1024);

        let request = client.request_for(
            "Write.",
            &GenerationConfig::for_task("chapter_draft").with_temperature(Some(0.2)),
        );
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(1024));
        assert_eq!(request.model, "base-model");
        assert_eq!(request.messages.last().unwrap().content, "Write.");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn test_missing_choice_text_is_detected() {
        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(empty.first_text().is_none());
        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant", "content": "  "}}]}"#)
                .unwrap();
        assert!(blank.first_text().is_none());
    }
}
