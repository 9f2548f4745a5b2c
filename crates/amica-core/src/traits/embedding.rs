// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding backend trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::AmicaError;

/// Adapter for generating vector embeddings from text.
///
/// Embedding adapters power semantic memory retrieval and duplicate
/// detection by converting fact content into vector representations.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generates an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AmicaError>;
}
