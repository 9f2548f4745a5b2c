// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in memory tools backed by the long-term fact store.
//!
//! When the store is unavailable, every memory tool is still registered and
//! wired to report a descriptive error. This keeps the dispatch table total:
//! the model can always choose a memory tool and gets a readable failure
//! instead of an unknown-tool surprise.

use std::sync::Arc;

use amica_core::AmicaError;
use amica_memory::MemoryService;
use async_trait::async_trait;

use crate::tool::{Tool, ToolOutput};

/// Error text reported when the store is not wired up.
const STORE_UNAVAILABLE: &str =
    "The memory store is not available. Cannot use memory tool.";

/// Fetches relevant facts from long-term memory.
///
/// Returns a JSON array of `{id, content}`; the executor reformats it into
/// a readable block for the conversation history.
pub struct FetchMemoryTool {
    service: Option<Arc<MemoryService>>,
    limit: usize,
}

impl FetchMemoryTool {
    pub fn new(service: Option<Arc<MemoryService>>, limit: usize) -> Self {
        Self { service, limit }
    }
}

#[async_trait]
impl Tool for FetchMemoryTool {
    fn name(&self) -> &str {
        "fetch_memory"
    }

    fn description(&self) -> &str {
        "Fetches relevant information from long-term memory based on a query."
    }

    fn instruction(&self) -> &str {
        "Provide a query describing the information you need from long-term memory. \
         Respond with a JSON object containing the 'query' key. \
         Example: {\"query\": \"details about project X discussed last week\"}"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Keywords or description of the information to retrieve from memory."
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, AmicaError> {
        let Some(service) = &self.service else {
            return Ok(ToolOutput::error(STORE_UNAVAILABLE));
        };
        let query = input["query"].as_str().unwrap_or_default();

        let facts = service.retrieve_by_similarity(query, self.limit).await?;
        let payload = serde_json::to_string(&facts)
            .map_err(|e| AmicaError::Internal(format!("failed to encode facts: {e}")))?;
        Ok(ToolOutput::ok(payload))
    }
}

/// Saves a new fact to long-term memory.
pub struct SaveMemoryTool {
    service: Option<Arc<MemoryService>>,
}

impl SaveMemoryTool {
    pub fn new(service: Option<Arc<MemoryService>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SaveMemoryTool {
    fn name(&self) -> &str {
        "save_memory"
    }

    fn description(&self) -> &str {
        "Saves a piece of information to long-term memory for future recall."
    }

    fn instruction(&self) -> &str {
        "Provide the specific information you want to save to long-term memory. \
         Respond with a JSON object containing the 'content' key. \
         Example: {\"content\": \"User prefers concise answers.\"}"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The information to store in long-term memory."
                }
            },
            "required": ["content"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, AmicaError> {
        let Some(service) = &self.service else {
            return Ok(ToolOutput::error(STORE_UNAVAILABLE));
        };
        let content = input["content"].as_str().unwrap_or_default();

        // A refused insert means the fact is already known. That is an
        // informational outcome, not a failure.
        match service.add_fact(content).await? {
            Some(id) => Ok(ToolOutput::ok(format!(
                "Fact saved to long-term memory with id {id}."
            ))),
            None => Ok(ToolOutput::ok(
                "This information is already stored in long-term memory; duplicate skipped.",
            )),
        }
    }
}

/// Replaces an existing fact in long-term memory.
pub struct UpdateMemoryTool {
    service: Option<Arc<MemoryService>>,
}

impl UpdateMemoryTool {
    pub fn new(service: Option<Arc<MemoryService>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for UpdateMemoryTool {
    fn name(&self) -> &str {
        "update_memory"
    }

    fn description(&self) -> &str {
        "Replaces an existing fact in long-term memory, identified by its memory_id, with new content."
    }

    fn instruction(&self) -> &str {
        "Provide the memory_id of an existing fact (from previously retrieved facts) and the \
         corrected content. Respond with a JSON object containing the 'memory_id' and 'content' keys. \
         Example: {\"memory_id\": \"3f2a...\", \"content\": \"User now lives in Berlin.\"}"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "memory_id": {
                    "type": "string",
                    "description": "The id of the fact to replace."
                },
                "content": {
                    "type": "string",
                    "description": "The new content for the fact."
                }
            },
            "required": ["memory_id", "content"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, AmicaError> {
        let Some(service) = &self.service else {
            return Ok(ToolOutput::error(STORE_UNAVAILABLE));
        };
        let memory_id = input["memory_id"].as_str().unwrap_or_default();
        let content = input["content"].as_str().unwrap_or_default();

        match service.update_fact(memory_id, content).await? {
            Some(new_id) => Ok(ToolOutput::ok(format!(
                "Memory {memory_id} replaced successfully. New fact id: {new_id}."
            ))),
            None => Ok(ToolOutput::error(format!(
                "Memory replacement failed. The provided memory_id '{memory_id}' was not found."
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amica_memory::FactStore;
    use amica_test_utils::MockEmbedder;

    async fn service() -> Arc<MemoryService> {
        let store = FactStore::open_in_memory().await.unwrap();
        Arc::new(MemoryService::new(store, Arc::new(MockEmbedder::new()), 0.95))
    }

    #[tokio::test]
    async fn unavailable_store_reports_error_output() {
        for tool in [
            Box::new(FetchMemoryTool::new(None, 5)) as Box<dyn Tool>,
            Box::new(SaveMemoryTool::new(None)),
            Box::new(UpdateMemoryTool::new(None)),
        ] {
            let output = tool
                .invoke(serde_json::json!({
                    "query": "q", "content": "c", "memory_id": "m"
                }))
                .await
                .unwrap();
            assert!(output.is_error);
            assert!(output.content.contains("not available"));
        }
    }

    #[tokio::test]
    async fn save_returns_id_message() {
        let tool = SaveMemoryTool::new(Some(service().await));
        let output = tool
            .invoke(serde_json::json!({"content": "User likes coffee"}))
            .await
            .unwrap();
        assert!(!output.is_error);
        assert!(output.content.contains("saved to long-term memory"));
    }

    #[tokio::test]
    async fn save_duplicate_is_informational_not_error() {
        let service = service().await;
        let tool = SaveMemoryTool::new(Some(service));
        tool.invoke(serde_json::json!({"content": "User likes coffee"}))
            .await
            .unwrap();
        let output = tool
            .invoke(serde_json::json!({"content": "User likes coffee"}))
            .await
            .unwrap();
        assert!(!output.is_error, "dedup is not a failure");
        assert!(output.content.contains("duplicate skipped"));
    }

    #[tokio::test]
    async fn fetch_returns_json_facts() {
        let service = service().await;
        service.add_fact("User likes coffee").await.unwrap();
        let tool = FetchMemoryTool::new(Some(service), 5);

        let output = tool
            .invoke(serde_json::json!({"query": "User likes coffee"}))
            .await
            .unwrap();
        assert!(!output.is_error);
        let facts: Vec<amica_core::RetrievedFact> =
            serde_json::from_str(&output.content).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].content, "User likes coffee");
    }

    #[tokio::test]
    async fn update_with_valid_id_reports_new_id() {
        let service = service().await;
        let id = service.add_fact("User lives in Paris").await.unwrap().unwrap();
        let tool = UpdateMemoryTool::new(Some(service));

        let output = tool
            .invoke(serde_json::json!({"memory_id": id, "content": "User lives in Berlin"}))
            .await
            .unwrap();
        assert!(!output.is_error);
        assert!(output.content.contains("replaced successfully"));
        assert!(output.content.contains(&id));
    }

    #[tokio::test]
    async fn update_with_unknown_id_is_error_output() {
        let tool = UpdateMemoryTool::new(Some(service().await));
        let output = tool
            .invoke(serde_json::json!({"memory_id": "ghost", "content": "anything"}))
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(output.content.contains("memory_id 'ghost' was not found"));
    }
}
