//! HTTP client for the `POST /chat` completion endpoint.

use async_trait::async_trait;
use parley_core::config::ChatConfig;
use parley_core::{ChatReply, ChatRequest, ErrorBody};
use tracing::debug;

use crate::error::ChatError;
use crate::surface::CompletionClient;

/// Shown when a non-success response carries no usable error body.
const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";

/// Posts `{ text, history }` to a chat endpoint and parses `{ reply }`.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCompletionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    /// Client for `config.endpoint`.
    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.endpoint.clone())
    }

    /// Use a preconfigured HTTP client (proxies, default headers).
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "Chat endpoint responded");

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.describe())
                .ok()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string());
            return Err(ChatError::Remote {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str::<ChatReply>(&body).map_err(|e| ChatError::Remote {
            status: status.as_u16(),
            detail: format!("malformed reply: {}", e),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
