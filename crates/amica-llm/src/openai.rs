// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat backend for the OpenAI chat-completions API.

use std::time::Duration;

use amica_core::{AmicaError, ChatBackend, ChatRequest, ProviderErrorKind};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Default model when none is configured.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Backend speaking the OpenAI chat-completions protocol.
///
/// JSON mode uses the provider's `response_format` request field. The API
/// key is attached per request because the client rotates keys.
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiBackend {
    /// Creates a backend against the given API base URL
    /// (e.g. `https://api.openai.com`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, AmicaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                AmicaError::provider(
                    ProviderErrorKind::Fatal,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &ChatRequest, api_key: &str) -> Result<String, AmicaError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });
        if request.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AmicaError::provider(
                    ProviderErrorKind::Transport,
                    format!("HTTP request failed: {e}"),
                )
            })?;

        let status = response.status();
        debug!(status = %status, "openai response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmicaError::provider(
                classify_status(status),
                format!("OpenAI API returned {status}: {body}"),
            ));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            AmicaError::provider(
                ProviderErrorKind::InvalidResponse,
                format!("failed to parse OpenAI response: {e}"),
            )
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(AmicaError::provider(
                ProviderErrorKind::InvalidResponse,
                "OpenAI response contained no content",
            ));
        }

        Ok(content.trim().to_string())
    }
}

/// Map an HTTP status to the failover classification.
fn classify_status(status: reqwest::StatusCode) -> ProviderErrorKind {
    match status.as_u16() {
        429 => ProviderErrorKind::RateLimit,
        401 | 403 => ProviderErrorKind::PermissionDenied,
        500..=599 => ProviderErrorKind::Transport,
        _ => ProviderErrorKind::Fatal,
    }
}
