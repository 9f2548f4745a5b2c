// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP embedding client for an OpenAI-compatible embeddings endpoint.

use std::time::Duration;

use amica_core::{AmicaError, Embedder};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Response shape of the embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

/// Embedding backend that calls an OpenAI-compatible `/v1/embeddings`
/// endpoint over HTTP.
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpEmbedder {
    /// Creates a new HTTP embedder.
    ///
    /// # Arguments
    /// * `base_url` - endpoint base, e.g. `https://api.openai.com`
    /// * `model` - embedding model identifier
    /// * `api_key` - bearer token for authentication
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, AmicaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AmicaError::Embedding(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AmicaError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AmicaError::Embedding(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmicaError::Embedding(format!(
                "embeddings endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| AmicaError::Embedding(format!("failed to parse response: {e}")))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| AmicaError::Embedding("endpoint returned no embeddings".to_string()))?;

        debug!(model = %self.model, dimensions = embedding.len(), "embedded text");
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embed_parses_response() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "object": "list",
            "data": [{"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]}],
            "model": "text-embedding-3-small",
        });

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(server.uri(), "text-embedding-3-small", "test-key").unwrap();
        let embedding = embedder.embed("hello").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(server.uri(), "text-embedding-3-small", "bad-key").unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, AmicaError::Embedding(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn embed_rejects_empty_data() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"object": "list", "data": [], "model": "m"});
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(server.uri(), "m", "k").unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(err.to_string().contains("no embeddings"));
    }
}
