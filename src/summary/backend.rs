//! Summarization backends.
//!
//! A backend turns one prompt into one completion. It knows nothing about
//! sections, segments or retries; those live in the orchestrator.

use crate::config::SummarySettings;
use crate::openai::{create_client, no_backoff};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Failure reported by a summarization backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Transient failures are worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::RateLimited(_) | BackendError::Timeout(_) | BackendError::Unavailable(_)
        )
    }
}

/// Something that completes text prompts.
#[async_trait]
pub trait SummarizationBackend: Send + Sync {
    /// Complete `prompt`, giving up after `timeout`.
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, BackendError>;
}

/// Backend for OpenAI-compatible chat completion APIs.
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiBackend {
    pub fn new(client: Client<OpenAIConfig>, model: &str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
            max_tokens,
        }
    }

    /// Build a backend from configuration. Fails if the API key is missing.
    pub fn from_settings(settings: &SummarySettings) -> crate::error::Result<Self> {
        // Retries belong to the orchestrator's RetryState only
        let client = create_client(&settings.endpoint())?.with_backoff(no_backoff());
        Ok(Self::new(
            client,
            &settings.model,
            settings.temperature,
            settings.max_tokens,
        ))
    }
}

#[async_trait]
impl SummarizationBackend for OpenAiBackend {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, BackendError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| BackendError::InvalidRequest(e.to_string()))?
                .into(),
        ];

        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;

        let response = tokio::time::timeout(timeout, self.client.chat().create(request))
            .await
            .map_err(|_| BackendError::Timeout(format!("no response after {}s", timeout.as_secs())))?
            .map_err(classify_openai_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| BackendError::Unavailable("empty response from model".to_string()))?;

        debug!("Received {} chars", content.len());
        Ok(content)
    }
}

fn classify_openai_error(error: OpenAIError) -> BackendError {
    match error {
        OpenAIError::Reqwest(e) => {
            if e.is_timeout() {
                return BackendError::Timeout(e.to_string());
            }
            match e.status().map(|s| s.as_u16()) {
                Some(401) | Some(403) => BackendError::Auth(e.to_string()),
                Some(429) => BackendError::RateLimited(e.to_string()),
                Some(400..=499) => BackendError::InvalidRequest(e.to_string()),
                _ => BackendError::Unavailable(e.to_string()),
            }
        }
        OpenAIError::ApiError(api) => classify_api_error(api.r#type.as_deref(), &api.message),
        OpenAIError::JSONDeserialize(e) => {
            BackendError::Unavailable(format!("malformed response: {}", e))
        }
        other => BackendError::InvalidRequest(other.to_string()),
    }
}

/// Map an API error body to a backend error.
///
/// Providers disagree on error codes, so the type and the message are both
/// consulted.
fn classify_api_error(kind: Option<&str>, message: &str) -> BackendError {
    let kind = kind.unwrap_or_default().to_lowercase();
    let lower = message.to_lowercase();
    let message = message.to_string();

    if kind.contains("auth")
        || lower.contains("api key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
    {
        BackendError::Auth(message)
    } else if lower.contains("rate limit") || (lower.contains("quota") && !lower.contains("billing")) {
        BackendError::RateLimited(message)
    } else if kind.contains("server")
        || lower.contains("overloaded")
        || lower.contains("unavailable")
        || lower.contains("try again")
    {
        BackendError::Unavailable(message)
    } else {
        BackendError::InvalidRequest(message)
    }
}
