//! Upstream chat-completions provider.
//!
//! The chat endpoint only needs "history plus new text in, reply text out",
//! so the upstream call sits behind [`CompletionProvider`]. The shipped
//! implementation speaks the OpenAI-compatible `/chat/completions` dialect
//! with OpenRouter's model-fallback extensions.

use std::time::Duration;

use async_trait::async_trait;
use parley_core::config::CompletionConfig;
use parley_core::{Role, Turn};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Errors from the upstream provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API key not set: environment variable {0} is empty")]
    MissingApiKey(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("upstream returned no completion")]
    EmptyCompletion,
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl From<ProviderError> for parley_core::ParleyError {
    fn from(err: ProviderError) -> Self {
        parley_core::ParleyError::Completion(err.to_string())
    }
}

/// Produces the assistant's reply to `text` given the prior turns.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, history: &[Turn], text: &str) -> Result<String, ProviderError>;

    /// Model identifier, for health reporting.
    fn model(&self) -> &str;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    models: Vec<&'a str>,
    provider: ProviderPreferences,
    messages: Vec<Message<'a>>,
    temperature: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    repetition_penalty: f32,
}

#[derive(Debug, Serialize)]
struct ProviderPreferences {
    allow_fallbacks: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: UpstreamErrorDetail,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

// =============================================================================
// OpenRouterProvider
// =============================================================================

/// OpenAI-compatible provider, OpenRouter by default.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    config: CompletionConfig,
}

impl OpenRouterProvider {
    /// Build a provider reading its API key from `config.api_key_env`.
    pub fn from_env(config: &CompletionConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        Self::new(config, api_key)
    }

    pub fn new(config: &CompletionConfig, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey(config.api_key_env.clone()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request<'a>(&'a self, history: &'a [Turn], text: &'a str) -> CompletionRequest<'a> {
        let mut messages: Vec<Message<'a>> = self
            .config
            .system_prompts
            .iter()
            .map(|prompt| Message {
                role: "system",
                content: prompt,
            })
            .collect();
        messages.extend(history.iter().map(|turn| Message {
            role: match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &turn.content,
        }));
        messages.push(Message {
            role: "user",
            content: text,
        });

        let models: Vec<&str> = if self.config.allow_fallbacks && !self.config.fallback_models.is_empty() {
            std::iter::once(self.config.model.as_str())
                .chain(self.config.fallback_models.iter().map(String::as_str))
                .collect()
        } else {
            Vec::new()
        };

        CompletionRequest {
            model: &self.config.model,
            models,
            provider: ProviderPreferences {
                allow_fallbacks: self.config.allow_fallbacks,
            },
            messages,
            temperature: self.config.temperature,
            frequency_penalty: self.config.frequency_penalty,
            presence_penalty: self.config.presence_penalty,
            repetition_penalty: self.config.repetition_penalty,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(&self, history: &[Turn], text: &str) -> Result<String, ProviderError> {
        let request = self.build_request(history, text);
        debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<UpstreamErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), error = %message, "Upstream completion failed");
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyCompletion)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// =============================================================================
// Tests
// =============================================================================
