// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in web search tool backed by the DuckDuckGo instant-answer API.

use std::time::Duration;

use amica_core::AmicaError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::tool::{Tool, ToolOutput};

/// Default maximum number of results included in the output.
const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
    // Category nodes nest their topics one level down.
    #[serde(rename = "Topics", default)]
    topics: Vec<RelatedTopic>,
}

/// Searches the web and returns a formatted result list.
///
/// The raw output is summarized by the executor's post-processing hook
/// before it reaches the conversation history.
pub struct WebSearchTool {
    client: reqwest::Client,
    base_url: String,
}

impl WebSearchTool {
    /// Creates a search tool against the public DuckDuckGo endpoint.
    pub fn new() -> Result<Self, AmicaError> {
        Self::with_base_url("https://api.duckduckgo.com")
    }

    /// Creates a search tool against a specific endpoint (for testing).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AmicaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AmicaError::Tool {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Searches the web for information based on a query and summarizes the findings."
    }

    fn instruction(&self) -> &str {
        "Provide a clear and concise search query. Respond with a JSON object containing \
         the 'query' key. Example: {\"query\": \"latest advancements in AI research\"}"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to use for finding information on the web."
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, AmicaError> {
        let query = input["query"].as_str().unwrap_or_default();
        debug!(query, "performing web search");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                return Ok(ToolOutput::error(format!("Web search failed: {e}")));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(ToolOutput::error(format!(
                "Web search endpoint returned {status}."
            )));
        }

        let answer: InstantAnswer = match response.json().await {
            Ok(a) => a,
            Err(e) => {
                return Ok(ToolOutput::error(format!(
                    "Could not parse web search response: {e}"
                )));
            }
        };

        let formatted = format_results(query, &answer, DEFAULT_MAX_RESULTS);
        Ok(ToolOutput::ok(formatted))
    }
}

/// Flatten the instant answer into a numbered result list.
fn format_results(query: &str, answer: &InstantAnswer, max_results: usize) -> String {
    let mut entries: Vec<(String, String)> = Vec::new();

    if !answer.abstract_text.is_empty() {
        entries.push((answer.abstract_text.clone(), answer.abstract_url.clone()));
    }
    collect_topics(&answer.related_topics, &mut entries, max_results);

    if entries.is_empty() {
        return format!("No web search results found for '{query}'.");
    }

    let mut out = format!("Web search results for '{query}':\n\n");
    for (i, (text, url)) in entries.iter().take(max_results).enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, text));
        if !url.is_empty() {
            out.push_str(&format!("   URL: {url}\n"));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn collect_topics(topics: &[RelatedTopic], entries: &mut Vec<(String, String)>, max: usize) {
    for topic in topics {
        if entries.len() >= max {
            return;
        }
        if !topic.text.is_empty() {
            entries.push((topic.text.clone(), topic.first_url.clone()));
        }
        collect_topics(&topic.topics, entries, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn formats_results_from_api() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "AbstractText": "Rust is a systems programming language.",
            "AbstractURL": "https://www.rust-lang.org",
            "RelatedTopics": [
                {"Text": "Rust (programming language)", "FirstURL": "https://example.com/rust"},
                {"Name": "Category", "Topics": [
                    {"Text": "Cargo package manager", "FirstURL": "https://example.com/cargo"}
                ]}
            ]
        });
        Mock::given(method("GET"))
            .and(query_param("q", "rust language"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let tool = WebSearchTool::with_base_url(server.uri()).unwrap();
        let output = tool
            .invoke(serde_json::json!({"query": "rust language"}))
            .await
            .unwrap();

        assert!(!output.is_error);
        assert!(output.content.contains("Web search results for 'rust language'"));
        assert!(output.content.contains("1. Rust is a systems programming language."));
        assert!(output.content.contains("Cargo package manager"));
    }

    #[tokio::test]
    async fn empty_answer_reports_no_results() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"AbstractText": "", "RelatedTopics": []});
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let tool = WebSearchTool::with_base_url(server.uri()).unwrap();
        let output = tool
            .invoke(serde_json::json!({"query": "nothing to find"}))
            .await
            .unwrap();
        assert!(!output.is_error);
        assert!(output.content.contains("No web search results found"));
    }

    #[tokio::test]
    async fn http_failure_is_error_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tool = WebSearchTool::with_base_url(server.uri()).unwrap();
        let output = tool
            .invoke(serde_json::json!({"query": "anything"}))
            .await
            .unwrap();
        assert!(output.is_error);
    }
}
