// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat backend trait for LLM provider integrations (OpenAI, Gemini).

use async_trait::async_trait;

use crate::error::AmicaError;
use crate::types::ChatMessage;

/// A provider-agnostic chat completion request.
///
/// Backends adapt this into their own wire format: message-role mapping,
/// system-prompt placement, and the provider's JSON-mode request shape.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier understood by the backend.
    pub model: String,
    /// Full prompt assembly, system messages included.
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request a JSON object response where the provider supports it.
    pub json_mode: bool,
}

/// Adapter for a single LLM provider.
///
/// One concrete variant exists per provider; the variant is selected at
/// construction time, never branched per call. The API key is passed per
/// request because the client, not the backend, owns the rotating key list.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Sends a completion request and returns the raw response text.
    async fn complete(&self, request: &ChatRequest, api_key: &str) -> Result<String, AmicaError>;
}
