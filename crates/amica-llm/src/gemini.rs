// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat backend for the Gemini generateContent API.

use std::time::Duration;

use amica_core::{AmicaError, ChatBackend, ChatRequest, ChatRole, ProviderErrorKind};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Default model when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Backend speaking the Gemini generateContent protocol.
///
/// System messages are folded into the request's `systemInstruction` block
/// (Gemini's contents accept only user/model turns), assistant messages map
/// to the `model` role, and JSON mode uses `responseMimeType`.
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiBackend {
    /// Creates a backend against the given API base URL
    /// (e.g. `https://generativelanguage.googleapis.com`).
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
impl ChatBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &ChatRequest, api_key: &str) -> Result<String, AmicaError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, request.model, api_key
        );

        let mut system_texts: Vec<&str> = Vec::new();
        let mut contents: Vec<serde_json::Value> = Vec::new();
        for message in &request.messages {
            match message.role {
                ChatRole::System => system_texts.push(&message.content),
                ChatRole::User => contents.push(serde_json::json!({
                    "role": "user",
                    "parts": [{"text": message.content}],
                })),
                ChatRole::Assistant => contents.push(serde_json::json!({
                    "role": "model",
                    "parts": [{"text": message.content}],
                })),
            }
        }

        let mut generation_config = serde_json::json!({
            "maxOutputTokens": request.max_tokens,
            "temperature": request.temperature,
        });
        if request.json_mode {
            generation_config["responseMimeType"] = serde_json::json!("application/json");
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if !system_texts.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{"text": system_texts.join("\n\n")}],
            });
        }

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            AmicaError::provider(
                ProviderErrorKind::Transport,
                format!("HTTP request failed: {e}"),
            )
        })?;

        let status = response.status();
        debug!(status = %status, "gemini response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmicaError::provider(
                classify_status(status),
                format!("Gemini API returned {status}: {body}"),
            ));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            AmicaError::provider(
                ProviderErrorKind::InvalidResponse,
                format!("failed to parse Gemini response: {e}"),
            )
        })?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AmicaError::provider(
                ProviderErrorKind::InvalidResponse,
                "Gemini response was empty or blocked",
            ));
        }

        Ok(text.trim().to_string())
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
