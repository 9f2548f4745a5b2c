// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool executor: validation, dispatch, and result post-processing.
//!
//! `execute` never returns an error to the caller. Tools return tagged
//! results internally; the translation into the `"Error: ..."` string
//! convention happens here, at the boundary where the model needs to read
//! failures as text.

use std::sync::Arc;

use amica_core::ChatMessage;
use amica_llm::LlmClient;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::registry::ToolRegistry;

/// Executes tools by name and post-processes their results.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    llm: Arc<LlmClient>,
}

impl ToolExecutor {
    /// Creates an executor over a registry.
    ///
    /// The LLM client is used for result post-processing (web search
    /// summarization), not for dispatch.
    pub fn new(registry: Arc<ToolRegistry>, llm: Arc<LlmClient>) -> Self {
        Self { registry, llm }
    }

    /// Executes the named tool with the given argument object.
    ///
    /// Always returns a string; every failure mode (unknown tool, schema
    /// validation, implementation error) is reported as an `"Error: ..."`
    /// prefixed result. That prefix is the sole failure signal the
    /// orchestrator checks.
    pub async fn execute(&self, tool_name: &str, arguments: &serde_json::Map<String, Value>) -> String {
        let Some(tool) = self.registry.find(tool_name) else {
            warn!(tool = tool_name, "attempted to execute unknown tool");
            return format!("Error: Unknown tool '{tool_name}'.");
        };

        let instance = Value::Object(arguments.clone());
        if let Err(message) = validate_arguments(&tool.parameters_schema(), &instance) {
            warn!(tool = tool_name, error = %message, "argument validation failed");
            return format!("Error: Invalid arguments for tool '{tool_name}': {message}");
        }

        info!(tool = tool_name, "executing tool");
        let output = match tool.invoke(instance).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = tool_name, error = %e, "tool execution failed");
                return format!("Error: Failed to execute tool '{tool_name}'. {e}");
            }
        };

        if output.is_error {
            let content = output.content;
            return if content.starts_with("Error:") {
                content
            } else {
                format!("Error: {content}")
            };
        }

        self.post_process(tool_name, arguments, output.content).await
    }

    /// Tool-specific result shaping after a successful invocation.
    async fn post_process(
        &self,
        tool_name: &str,
        arguments: &serde_json::Map<String, Value>,
        result: String,
    ) -> String {
        match tool_name {
            "search_web" => self.summarize_search_results(arguments, result).await,
            "fetch_memory" => format_fetched_facts(&result),
            _ => result,
        }
    }

    /// Summarize raw web search output with a secondary LLM call.
    ///
    /// Falls back to the raw results when summarization itself errors.
    async fn summarize_search_results(
        &self,
        arguments: &serde_json::Map<String, Value>,
        raw_results: String,
    ) -> String {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or("N/A");
        debug!(query, "summarizing web search results");

        let prompt = format!(
            "Please summarize the following web search results and make them easy to read:\n\n{raw_results}"
        );
        let messages = vec![ChatMessage::user(prompt)];

        match self
            .llm
            .generate_final_response(&messages, "You are an expert summarization assistant.")
            .await
        {
            Ok(summary) if !summary.starts_with("Error:") => summary,
            Ok(_) | Err(_) => {
                warn!("failed to summarize web search results, using raw results");
                raw_results
            }
        }
    }
}

/// Validate the argument object against the tool's JSON Schema.
///
/// Returns the first validation failure as a descriptive string.
fn validate_arguments(schema: &Value, instance: &Value) -> Result<(), String> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| format!("invalid tool schema: {e}"))?;
    validator
        .validate(instance)
        .map_err(|e| e.to_string())
}

/// Reformat the fetch_memory JSON payload into a readable block.
///
/// The tool returns a JSON array of `{id, content}`; the model reads the
/// formatted list (ids included, so follow-up updates can reference them).
fn format_fetched_facts(raw: &str) -> String {
    let facts: Vec<amica_core::RetrievedFact> = match serde_json::from_str(raw) {
        Ok(facts) => facts,
        Err(_) => return raw.to_string(),
    };

    if facts.is_empty() {
        return "Memory fetch results:\n\nNo relevant facts found.".to_string();
    }

    let mut formatted = String::from("Memory fetch results:\n\nRelevant facts:\n");
    for fact in &facts {
        formatted.push_str(&format!("- [id: {}] {}\n", fact.id, fact.content));
    }
    formatted.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{Tool, ToolOutput};
    use amica_core::AmicaError;
    use amica_test_utils::MockBackend;
    use async_trait::async_trait;

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "always_fails"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn instruction(&self) -> &str {
            "Respond with an empty JSON object {}."
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}, "required": []})
        }

        async fn invoke(&self, _input: serde_json::Value) -> Result<ToolOutput, AmicaError> {
            Err(AmicaError::Tool {
                message: "deliberate failure".into(),
            })
        }
    }

    struct GreetTool;

    #[async_trait]
    impl Tool for GreetTool {
        fn name(&self) -> &str {
            "greet"
        }

        fn description(&self) -> &str {
            "Greets a person"
        }

        fn instruction(&self) -> &str {
            "Respond with a JSON object containing the 'name' key. Example: {\"name\": \"Ada\"}"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
            })
        }

        async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, AmicaError> {
            let name = input["name"].as_str().unwrap_or("stranger");
            Ok(ToolOutput::ok(format!("Hello, {name}!")))
        }
    }

    fn executor_with(tools: Vec<Arc<dyn Tool>>) -> ToolExecutor {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        let backend = Arc::new(MockBackend::new());
        let llm = Arc::new(LlmClient::new(backend, "test-model", vec!["k".into()]).unwrap());
        ToolExecutor::new(Arc::new(registry), llm)
    }

    fn args(json: serde_json::Value) -> serde_json::Map<String, Value> {
        json.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn unknown_tool_returns_error_string() {
        let executor = executor_with(vec![]);
        let result = executor.execute("mystery", &args(serde_json::json!({}))).await;
        assert!(result.starts_with("Error:"));
        assert!(result.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn missing_required_argument_is_rejected() {
        let executor = executor_with(vec![Arc::new(GreetTool)]);
        let result = executor.execute("greet", &args(serde_json::json!({}))).await;
        assert!(result.starts_with("Error: Invalid arguments"), "got: {result}");
    }

    #[tokio::test]
    async fn wrong_argument_type_is_rejected() {
        let executor = executor_with(vec![Arc::new(GreetTool)]);
        let result = executor
            .execute("greet", &args(serde_json::json!({"name": 42})))
            .await;
        assert!(result.starts_with("Error: Invalid arguments"), "got: {result}");
    }

    #[tokio::test]
    async fn implementation_error_becomes_error_string() {
        let executor = executor_with(vec![Arc::new(FailingTool)]);
        let result = executor
            .execute("always_fails", &args(serde_json::json!({})))
            .await;
        assert!(result.starts_with("Error: Failed to execute tool"), "got: {result}");
        assert!(result.contains("deliberate failure"));
    }

    #[tokio::test]
    async fn successful_invocation_returns_content() {
        let executor = executor_with(vec![Arc::new(GreetTool)]);
        let result = executor
            .execute("greet", &args(serde_json::json!({"name": "Ada"})))
            .await;
        assert_eq!(result, "Hello, Ada!");
    }

    #[test]
    fn format_fetched_facts_readable_block() {
        let raw = serde_json::json!([
            {"id": "f1", "content": "User likes coffee"},
            {"id": "f2", "content": "User lives in Berlin"},
        ])
        .to_string();
        let formatted = format_fetched_facts(&raw);
        assert!(formatted.contains("Relevant facts:"));
        assert!(formatted.contains("[id: f1] User likes coffee"));
        assert!(formatted.contains("[id: f2] User lives in Berlin"));
    }

    #[test]
    fn format_fetched_facts_empty() {
        let formatted = format_fetched_facts("[]");
        assert!(formatted.contains("No relevant facts found."));
    }

    #[test]
    fn format_fetched_facts_passes_through_non_json() {
        assert_eq!(format_fetched_facts("not json"), "not json");
    }
}
