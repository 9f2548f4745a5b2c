// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat backend for deterministic testing.
//!
//! `MockBackend` implements `ChatBackend` with pre-configured responses,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use amica_core::{AmicaError, ChatBackend, ChatRequest, ProviderErrorKind};

/// A single scripted backend outcome.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Return this text.
    Text(String),
    /// Fail with a provider error of the given kind.
    Error(ProviderErrorKind, String),
}

/// A mock chat backend that pops scripted responses from a FIFO queue.
///
/// When the queue is empty, a default "mock response" text is returned.
/// Every call is recorded with the API key it was made with, so tests can
/// assert on call counts and key rotation.
pub struct MockBackend {
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    calls: Arc<Mutex<Vec<(ChatRequest, String)>>>,
    exhausted_fallback: Arc<Mutex<Option<ScriptedResponse>>>,
}

impl MockBackend {
    /// Create a mock backend with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            exhausted_fallback: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a mock backend that fails every call with the given error.
    pub fn failing_with(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        let backend = Self::new();
        let fallback = backend.exhausted_fallback.clone();
        *fallback.try_lock().expect("fresh fallback") =
            Some(ScriptedResponse::Error(kind, message.into()));
        backend
    }

    /// Create a mock backend pre-loaded with text responses.
    pub fn with_responses(responses: Vec<&str>) -> Self {
        let backend = Self::new();
        {
            let queue = backend.responses.clone();
            let mut items: VecDeque<ScriptedResponse> = VecDeque::new();
            for r in responses {
                items.push_back(ScriptedResponse::Text(r.to_string()));
            }
            // Queue is freshly created; try_lock cannot fail here.
            *queue.try_lock().expect("fresh queue") = items;
        }
        backend
    }

    /// Append a text response to the queue.
    pub async fn push_text(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(ScriptedResponse::Text(text.into()));
    }

    /// Append an error outcome to the queue.
    pub async fn push_error(&self, kind: ProviderErrorKind, message: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(ScriptedResponse::Error(kind, message.into()));
    }

    /// Number of completed calls so far.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// API keys in the order calls used them.
    pub async fn used_keys(&self) -> Vec<String> {
        self.calls.lock().await.iter().map(|(_, k)| k.clone()).collect()
    }

    /// The recorded requests, in call order.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.calls.lock().await.iter().map(|(r, _)| r.clone()).collect()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest, api_key: &str) -> Result<String, AmicaError> {
        self.calls
            .lock()
            .await
            .push((request.clone(), api_key.to_string()));

        let next = self.responses.lock().await.pop_front();
        let next = match next {
            Some(scripted) => scripted,
            None => self
                .exhausted_fallback
                .lock()
                .await
                .clone()
                .unwrap_or_else(|| ScriptedResponse::Text("mock response".to_string())),
        };
        match next {
            ScriptedResponse::Text(text) => Ok(text),
            ScriptedResponse::Error(kind, message) => Err(AmicaError::provider(kind, message)),
        }
    }
}
