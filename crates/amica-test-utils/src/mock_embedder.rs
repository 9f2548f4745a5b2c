// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding backend with deterministic, controllable vectors.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use amica_core::{AmicaError, Embedder};

/// Embedding dimensions used for auto-assigned vectors.
const DIMENSIONS: usize = 32;

/// Deterministic embedder for tests.
///
/// Texts registered via [`with_mapping`](MockEmbedder::with_mapping) return
/// their configured vector, which lets tests control pairwise similarity
/// precisely. Unseen texts are lazily assigned distinct basis vectors, so
/// any two of them are orthogonal (similarity 0.0) and repeated embeddings
/// of the same text are identical.
pub struct MockEmbedder {
    mappings: Mutex<HashMap<String, Vec<f32>>>,
    next_basis: Mutex<usize>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            mappings: Mutex::new(HashMap::new()),
            next_basis: Mutex::new(0),
        }
    }

    /// Register an explicit embedding for a text.
    pub fn with_mapping(self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.mappings
            .lock()
            .expect("mock embedder mutex")
            .insert(text.into(), embedding);
        self
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AmicaError> {
        let mut mappings = self.mappings.lock().expect("mock embedder mutex");
        if let Some(existing) = mappings.get(text) {
            return Ok(existing.clone());
        }

        let mut next = self.next_basis.lock().expect("mock embedder mutex");
        let index = *next % DIMENSIONS;
        *next += 1;

        let mut vector = vec![0.0; DIMENSIONS];
        vector[index] = 1.0;
        mappings.insert(text.to_string(), vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mapped_text_returns_configured_vector() {
        let embedder = MockEmbedder::new().with_mapping("hello", vec![0.5, 0.5]);
        assert_eq!(embedder.embed("hello").await.unwrap(), vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn unseen_texts_get_orthogonal_vectors() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed("alpha").await.unwrap();
        let b = embedder.embed("beta").await.unwrap();
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        assert_eq!(dot, 0.0);
    }

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let embedder = MockEmbedder::new();
        let first = embedder.embed("repeat").await.unwrap();
        let second = embedder.embed("repeat").await.unwrap();
        assert_eq!(first, second);
    }
}
