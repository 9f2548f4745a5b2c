// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider-agnostic LLM client with multi-key round-robin failover.
//!
//! The client owns the ordered API-key list for the configured provider and
//! exposes the three operations the orchestrator needs: structured tool
//! choice, tool-argument generation, and free-text final responses. Rate
//! limit, permission, and transport errors (plus malformed payloads from the
//! two structured operations) are retried against the next key, up to one
//! attempt per configured key. Fatal errors abort immediately.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use amica_core::{AmicaError, ChatBackend, ChatMessage, ChatRequest, ProviderErrorKind};
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{ArgumentPrompt, ToolChoiceWire, ToolSummary};

/// Max tokens granted to structured decision calls by default.
const DEFAULT_DECISION_MAX_TOKENS: u32 = 150;

/// Max tokens granted to free-text generation by default.
const DEFAULT_MAX_TOKENS: u32 = 450;

/// Sampling temperatures per operation.
const DECISION_TEMPERATURE: f32 = 0.2;
const RESPONSE_TEMPERATURE: f32 = 0.7;

/// Handles communication with the underlying LLM provider.
///
/// The round-robin key cursor is shared mutable state within one client
/// instance; concurrent turns on the same instance must be serialized
/// externally.
pub struct LlmClient {
    backend: Arc<dyn ChatBackend>,
    model: String,
    api_keys: Vec<String>,
    cursor: AtomicUsize,
    max_tokens: u32,
    decision_max_tokens: u32,
}

impl LlmClient {
    /// Creates a client over a concrete provider backend.
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        model: impl Into<String>,
        api_keys: Vec<String>,
    ) -> Result<Self, AmicaError> {
        if api_keys.is_empty() {
            return Err(AmicaError::Config(format!(
                "no API keys configured for provider `{}`",
                backend.name()
            )));
        }
        Ok(Self {
            backend,
            model: model.into(),
            api_keys,
            cursor: AtomicUsize::new(0),
            max_tokens: DEFAULT_MAX_TOKENS,
            decision_max_tokens: DEFAULT_DECISION_MAX_TOKENS,
        })
    }

    /// Overrides the per-operation token limits.
    pub fn with_token_limits(mut self, max_tokens: u32, decision_max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self.decision_max_tokens = decision_max_tokens;
        self
    }

    /// The model identifier in use.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The provider name of the underlying backend.
    pub fn provider(&self) -> &str {
        self.backend.name()
    }

    /// Ask the model to pick a tool name (or null) from a constrained set.
    ///
    /// `forced` narrows the choosable set to the named subset. Any name the
    /// model returns outside the choosable set is rejected to `None`.
    pub async fn decide_next_action(
        &self,
        history: &[ChatMessage],
        choosable: &[ToolSummary],
        forced: Option<&[&str]>,
    ) -> Result<Option<String>, AmicaError> {
        let options: Vec<&ToolSummary> = match forced {
            Some(names) => choosable
                .iter()
                .filter(|t| names.contains(&t.name.as_str()))
                .collect(),
            None => choosable.iter().collect(),
        };

        let mut messages = history.to_vec();
        messages.push(ChatMessage::system(build_tool_choice_prompt(&options)));

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.decision_max_tokens,
            temperature: DECISION_TEMPERATURE,
            json_mode: true,
        };

        let allowed: HashSet<&str> = options.iter().map(|t| t.name.as_str()).collect();
        self.complete_structured(&request, |text| {
            let json = extract_json_object(text)?;
            let wire: ToolChoiceWire = serde_json::from_str(json).ok()?;
            Some(match wire.tool_name {
                Some(name) if allowed.contains(name.as_str()) => Some(name),
                Some(other) => {
                    warn!(tool = %other, "model chose a tool outside the choosable set");
                    None
                }
                None => None,
            })
        })
        .await
    }

    /// Ask the model for a JSON argument object for the given tool.
    ///
    /// When the tool's schema declares no properties and no required keys,
    /// this short-circuits to an empty object without calling the model.
    pub async fn generate_tool_arguments(
        &self,
        tool: &ArgumentPrompt,
        history: &[ChatMessage],
    ) -> Result<serde_json::Map<String, Value>, AmicaError> {
        if schema_has_no_arguments(&tool.schema) {
            debug!(tool = %tool.tool_name, "tool takes no arguments, skipping generation");
            return Ok(serde_json::Map::new());
        }

        let mut messages = history.to_vec();
        messages.push(ChatMessage::system(build_argument_prompt(tool)));

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.decision_max_tokens.max(300),
            temperature: DECISION_TEMPERATURE,
            json_mode: true,
        };

        self.complete_structured(&request, |text| {
            let json = extract_json_object(text)?;
            let value: Value = serde_json::from_str(json).ok()?;
            value.as_object().cloned()
        })
        .await
    }

    /// Generate the final natural-language response.
    ///
    /// `personality` is used as a fallback system message when the caller's
    /// assembly does not already lead with one.
    pub async fn generate_final_response(
        &self,
        messages: &[ChatMessage],
        personality: &str,
    ) -> Result<String, AmicaError> {
        let mut messages = messages.to_vec();
        let leads_with_system = messages
            .first()
            .is_some_and(|m| m.role == amica_core::ChatRole::System);
        if !leads_with_system && !personality.is_empty() {
            messages.insert(0, ChatMessage::system(personality));
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: RESPONSE_TEMPERATURE,
            json_mode: false,
        };

        self.complete_structured(&request, |text| Some(text.to_string()))
            .await
    }

    /// Run one request with key rotation.
    ///
    /// A parse failure counts like a transient provider error: a malformed
    /// response from one attempt does not necessarily recur on another, and
    /// the retry costs nothing extra since a fresh key is used each time.
    async fn complete_structured<T>(
        &self,
        request: &ChatRequest,
        mut parse: impl FnMut(&str) -> Option<T>,
    ) -> Result<T, AmicaError> {
        let mut last_error: Option<AmicaError> = None;

        for attempt in 0..self.api_keys.len() {
            let key = self.next_key();
            match self.backend.complete(request, key).await {
                Ok(text) => match parse(&text) {
                    Some(value) => return Ok(value),
                    None => {
                        warn!(attempt, provider = self.backend.name(), "malformed structured response, rotating key");
                        last_error = Some(AmicaError::provider(
                            ProviderErrorKind::InvalidResponse,
                            format!("malformed structured response: {text}"),
                        ));
                    }
                },
                Err(e) => match e.provider_kind() {
                    Some(kind) if kind.rotates_key() => {
                        warn!(attempt, provider = self.backend.name(), error = %e, "provider error, rotating key");
                        last_error = Some(e);
                    }
                    _ => return Err(e),
                },
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AmicaError::provider(ProviderErrorKind::Fatal, "no API keys configured")
        }))
    }

    /// Advance the round-robin cursor and return the next key.
    fn next_key(&self) -> &str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.api_keys.len();
        &self.api_keys[index]
    }
}

/// System prompt enumerating exactly the choosable tools.
fn build_tool_choice_prompt(options: &[&ToolSummary]) -> String {
    let mut prompt = String::from(
        "Decide the next action. You may use one of the following tools, or no tool at all.\n\nAvailable tools:\n",
    );
    if options.is_empty() {
        prompt.push_str("(none)\n");
    }
    for tool in options {
        prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }
    prompt.push_str(
        "\nRespond ONLY with a JSON object of the form {\"tool_name\": \"<name>\"} to use a tool, \
         or {\"tool_name\": null} if no tool is needed. Do not include explanations or markdown formatting.",
    );
    prompt
}

/// System prompt requesting a JSON argument object for one tool.
fn build_argument_prompt(tool: &ArgumentPrompt) -> String {
    format!(
        "Generate the arguments for the tool '{}'.\n{}\n\nThe arguments must be a JSON object matching this schema. \
         Include exactly the required keys. Respond ONLY with the JSON object, no explanations or markdown formatting:\n{}",
        tool.tool_name,
        tool.instruction,
        serde_json::to_string_pretty(&tool.schema).unwrap_or_else(|_| "{}".to_string()),
    )
}

/// True when a schema declares neither properties nor required keys.
fn schema_has_no_arguments(schema: &Value) -> bool {
    let has_properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty());
    let has_required = schema
        .get("required")
        .and_then(Value::as_array)
        .is_some_and(|r| !r.is_empty());
    !has_properties && !has_required
}

/// Slice out the first JSON object in a response, tolerating markdown fences
/// and surrounding prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use amica_test_utils::MockBackend;

    fn summaries() -> Vec<ToolSummary> {
        vec![
            ToolSummary::new("search_web", "Searches the web."),
            ToolSummary::new("save_memory", "Saves a fact."),
            ToolSummary::new("update_memory", "Updates a fact."),
        ]
    }

    fn history() -> Vec<ChatMessage> {
        vec![ChatMessage::user("hello")]
    }

    fn client(backend: Arc<MockBackend>, keys: Vec<&str>) -> LlmClient {
        LlmClient::new(
            backend,
            "test-model",
            keys.into_iter().map(String::from).collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_empty_key_list() {
        let backend = Arc::new(MockBackend::new());
        let result = LlmClient::new(backend, "m", vec![]);
        assert!(matches!(result, Err(AmicaError::Config(_))));
    }

    #[tokio::test]
    async fn decide_parses_tool_name() {
        let backend = Arc::new(MockBackend::with_responses(vec![
            "{\"tool_name\": \"search_web\"}",
        ]));
        let client = client(backend, vec!["k1"]);
        let choice = client
            .decide_next_action(&history(), &summaries(), None)
            .await
            .unwrap();
        assert_eq!(choice.as_deref(), Some("search_web"));
    }

    #[tokio::test]
    async fn decide_parses_null() {
        let backend = Arc::new(MockBackend::with_responses(vec!["{\"tool_name\": null}"]));
        let client = client(backend, vec!["k1"]);
        let choice = client
            .decide_next_action(&history(), &summaries(), None)
            .await
            .unwrap();
        assert!(choice.is_none());
    }

    #[tokio::test]
    async fn decide_rejects_name_outside_choosable_set() {
        let backend = Arc::new(MockBackend::with_responses(vec![
            "{\"tool_name\": \"rm_rf\"}",
        ]));
        let client = client(backend, vec!["k1"]);
        let choice = client
            .decide_next_action(&history(), &summaries(), None)
            .await
            .unwrap();
        assert!(choice.is_none(), "unknown tool names default to null");
    }

    #[tokio::test]
    async fn decide_forced_subset_rejects_other_tools() {
        let backend = Arc::new(MockBackend::with_responses(vec![
            "{\"tool_name\": \"search_web\"}",
        ]));
        let client = client(backend, vec!["k1"]);
        let choice = client
            .decide_next_action(&history(), &summaries(), Some(&["save_memory", "update_memory"]))
            .await
            .unwrap();
        assert!(choice.is_none(), "forced subset excludes search_web");
    }

    #[tokio::test]
    async fn decide_tolerates_markdown_fences() {
        let backend = Arc::new(MockBackend::with_responses(vec![
            "```json\n{\"tool_name\": \"save_memory\"}\n```",
        ]));
        let client = client(backend, vec!["k1"]);
        let choice = client
            .decide_next_action(&history(), &summaries(), None)
            .await
            .unwrap();
        assert_eq!(choice.as_deref(), Some("save_memory"));
    }

    #[tokio::test]
    async fn malformed_json_rotates_to_next_key() {
        let backend = Arc::new(MockBackend::with_responses(vec![
            "this is not JSON",
            "{\"tool_name\": \"search_web\"}",
        ]));
        let client = client(backend.clone(), vec!["k1", "k2"]);
        let choice = client
            .decide_next_action(&history(), &summaries(), None)
            .await
            .unwrap();
        assert_eq!(choice.as_deref(), Some("search_web"));
        assert_eq!(backend.used_keys().await, vec!["k1", "k2"]);
    }

    #[tokio::test]
    async fn rate_limit_rotates_then_succeeds() {
        let backend = Arc::new(MockBackend::new());
        backend
            .push_error(ProviderErrorKind::RateLimit, "too many requests")
            .await;
        backend.push_text("{\"tool_name\": null}").await;
        let client = client(backend.clone(), vec!["k1", "k2"]);
        let choice = client
            .decide_next_action(&history(), &summaries(), None)
            .await
            .unwrap();
        assert!(choice.is_none());
        assert_eq!(backend.call_count().await, 2);
    }

    #[tokio::test]
    async fn exhausting_all_keys_returns_typed_error() {
        let backend = Arc::new(MockBackend::new());
        backend
            .push_error(ProviderErrorKind::RateLimit, "limited")
            .await;
        backend
            .push_error(ProviderErrorKind::RateLimit, "limited")
            .await;
        let client = client(backend.clone(), vec!["k1", "k2"]);
        let err = client
            .decide_next_action(&history(), &summaries(), None)
            .await
            .unwrap_err();
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::RateLimit));
        assert_eq!(backend.call_count().await, 2, "one attempt per key");
    }

    #[tokio::test]
    async fn fatal_error_aborts_without_rotation() {
        let backend = Arc::new(MockBackend::new());
        backend
            .push_error(ProviderErrorKind::Fatal, "bad request")
            .await;
        let client = client(backend.clone(), vec!["k1", "k2", "k3"]);
        let err = client
            .decide_next_action(&history(), &summaries(), None)
            .await
            .unwrap_err();
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::Fatal));
        assert_eq!(backend.call_count().await, 1);
    }

    #[tokio::test]
    async fn empty_schema_short_circuits_without_llm_call() {
        let backend = Arc::new(MockBackend::new());
        let client = client(backend.clone(), vec!["k1"]);
        let tool = ArgumentPrompt {
            tool_name: "get_current_time".to_string(),
            instruction: "Respond with an empty JSON object {}.".to_string(),
            schema: serde_json::json!({"type": "object", "properties": {}, "required": []}),
        };
        let args = client.generate_tool_arguments(&tool, &history()).await.unwrap();
        assert!(args.is_empty());
        assert_eq!(backend.call_count().await, 0, "no LLM call for empty schemas");
    }

    #[tokio::test]
    async fn argument_generation_parses_object() {
        let backend = Arc::new(MockBackend::with_responses(vec![
            "{\"query\": \"rust async\"}",
        ]));
        let client = client(backend, vec!["k1"]);
        let tool = ArgumentPrompt {
            tool_name: "search_web".to_string(),
            instruction: "Provide a search query.".to_string(),
            schema: serde_json::json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"],
            }),
        };
        let args = client.generate_tool_arguments(&tool, &history()).await.unwrap();
        assert_eq!(args.get("query").and_then(Value::as_str), Some("rust async"));
    }

    #[tokio::test]
    async fn final_response_returns_text() {
        let backend = Arc::new(MockBackend::with_responses(vec!["Hello there!"]));
        let client = client(backend, vec!["k1"]);
        let text = client
            .generate_final_response(&history(), "You are helpful.")
            .await
            .unwrap();
        assert_eq!(text, "Hello there!");
    }

    #[tokio::test]
    async fn final_response_inserts_personality_fallback() {
        let backend = Arc::new(MockBackend::with_responses(vec!["ok"]));
        let client = client(backend.clone(), vec!["k1"]);
        client
            .generate_final_response(&history(), "You are helpful.")
            .await
            .unwrap();
        let requests = backend.requests().await;
        assert_eq!(requests[0].messages[0].content, "You are helpful.");
    }

    #[tokio::test]
    async fn round_robin_cursor_advances_across_calls() {
        let backend = Arc::new(MockBackend::with_responses(vec!["a", "b", "c"]));
        let client = client(backend.clone(), vec!["k1", "k2"]);
        client.generate_final_response(&history(), "p").await.unwrap();
        client.generate_final_response(&history(), "p").await.unwrap();
        client.generate_final_response(&history(), "p").await.unwrap();
        assert_eq!(backend.used_keys().await, vec!["k1", "k2", "k1"]);
    }

    #[test]
    fn extract_json_object_handles_prose() {
        assert_eq!(
            extract_json_object("Sure! {\"a\": 1} hope that helps"),
            Some("{\"a\": 1}")
        );
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn schema_detection() {
        assert!(schema_has_no_arguments(&serde_json::json!({
            "type": "object", "properties": {}, "required": []
        })));
        assert!(!schema_has_no_arguments(&serde_json::json!({
            "type": "object",
            "properties": {"q": {"type": "string"}},
            "required": ["q"],
        })));
    }
}
