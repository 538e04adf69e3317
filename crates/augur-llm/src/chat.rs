//! Chat-completion client (OpenRouter-compatible)

use async_trait::async_trait;
use augur_config::TextConfig;
use augur_utils::error::GenError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::LlmSetupError;
use crate::http_client::{HttpClient, TransportFailure, error_body};

/// Fixed system role sent with every prompt
pub const SYSTEM_PROMPT: &str = "You are an experienced tarot reader with a deep understanding of the cards \
and the ability to give precise, helpful readings.";

/// Turns a prompt into narrative text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// # Errors
    ///
    /// See [`GenError`]. Implementations do not retry.
    async fn generate(&self, prompt: &str) -> Result<String, GenError>;
}

/// Everything a [`ChatCompletionClient`] needs besides the HTTP client
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub referer: String,
    pub title: String,
}

impl ChatSettings {
    /// # Errors
    ///
    /// `LlmSetupError::MissingConfig` when no API key is configured.
    pub fn from_config(config: &TextConfig) -> Result<Self, LlmSetupError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmSetupError::MissingConfig("text.api_key"))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }
}

/// Stateless wrapper around a chat-completion endpoint
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: HttpClient,
    settings: ChatSettings,
}

impl ChatCompletionClient {
    #[must_use]
    pub fn new(http: HttpClient, settings: ChatSettings) -> Self {
        Self { http, settings }
    }

    /// # Errors
    ///
    /// See [`ChatSettings::from_config`].
    pub fn from_config(http: HttpClient, config: &TextConfig) -> Result<Self, LlmSetupError> {
        Ok(Self::new(http, ChatSettings::from_config(config)?))
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenError> {
        let settings = &self.settings;
        debug!(
            model = %settings.model,
            prompt_chars = prompt.chars().count(),
            max_tokens = settings.max_tokens,
            "Requesting chat completion"
        );

        let request = self
            .http
            .inner()
            .post(&settings.base_url)
            .bearer_auth(&settings.api_key)
            .header("HTTP-Referer", &settings.referer)
            .header("X-Title", &settings.title)
            .json(&self.request_body(prompt));

        let started = Instant::now();
        let response = self
            .http
            .send(request, settings.timeout, "text")
            .await
            .map_err(|failure| match failure {
                TransportFailure::Timeout(after) => GenError::Timeout(after),
                TransportFailure::Network(msg) => GenError::Network(msg),
            })?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat completion responded"
        );

        if !status.is_success() {
            let body = error_body(response).await;
            warn!(status = status.as_u16(), "Chat completion rejected");
            return Err(GenError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GenError::Network(format!("failed to read response body: {e}")))?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| GenError::Decode(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenError::EmptyResponse)?;

        debug!(content_chars = content.chars().count(), "Chat completion received");
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
