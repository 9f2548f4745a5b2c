// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding-backed memory operations: insert-time dedup, similarity
//! retrieval, delete-then-reinsert updates, and the duplicate sweep.

use std::sync::Arc;

use amica_core::{AmicaError, Embedder, RetrievedFact};
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::FactStore;
use crate::types::{StoredFact, cosine_similarity};

/// High-level memory store used by the orchestrator and memory tools.
///
/// A single similarity threshold governs both insert-time dedup and the
/// cleanup sweep, so the two paths agree about what counts as a duplicate.
pub struct MemoryService {
    store: FactStore,
    embedder: Arc<dyn Embedder>,
    similarity_threshold: f32,
}

impl MemoryService {
    /// Creates a new memory service over an opened fact store.
    pub fn new(store: FactStore, embedder: Arc<dyn Embedder>, similarity_threshold: f64) -> Self {
        Self {
            store,
            embedder,
            similarity_threshold: similarity_threshold as f32,
        }
    }

    /// Persist a new fact, unless a near-duplicate already exists.
    ///
    /// Returns the new fact id, or `None` when the content's embedding is at
    /// or above the similarity threshold against an existing fact. The `None`
    /// return means "already known"; callers must not treat it as an error.
    pub async fn add_fact(&self, content: &str) -> Result<Option<String>, AmicaError> {
        let embedding = self.embedder.embed(content).await?;

        let existing = self.store.all_embeddings().await?;
        if let Some((dup_id, sim)) = find_most_similar(&embedding, &existing)
            && sim >= self.similarity_threshold
        {
            debug!(
                duplicate_of = %dup_id,
                similarity = sim,
                "fact already known, skipping insert"
            );
            return Ok(None);
        }

        let fact = StoredFact {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            embedding,
            created_at: now_timestamp(),
            metadata: None,
        };
        self.store.insert(&fact).await?;
        debug!(id = %fact.id, "fact added");
        Ok(Some(fact.id))
    }

    /// Retrieve the facts most similar to the query, best first.
    ///
    /// Similarity scores stay internal; only id and content surface.
    pub async fn retrieve_by_similarity(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedFact>, AmicaError> {
        let query_embedding = self.embedder.embed(query).await?;
        let existing = self.store.all_embeddings().await?;

        let mut ranked: Vec<(String, f32)> = existing
            .into_iter()
            .filter(|(_, emb)| emb.len() == query_embedding.len())
            .map(|(id, emb)| {
                let sim = cosine_similarity(&query_embedding, &emb);
                (id, sim)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(limit);

        let mut results = Vec::with_capacity(ranked.len());
        for (id, _) in ranked {
            if let Some(fact) = self.store.get(&id).await? {
                results.push(RetrievedFact {
                    id: fact.id,
                    content: fact.content,
                });
            }
        }
        Ok(results)
    }

    /// Replace a fact's content by deleting the old row and inserting a
    /// fresh one under a new id. Never mutates in place.
    ///
    /// Returns the new id, or `None` when the given id does not exist (the
    /// whole operation aborts before any insertion).
    pub async fn update_fact(
        &self,
        id: &str,
        new_content: &str,
    ) -> Result<Option<String>, AmicaError> {
        if !self.store.delete(id).await? {
            debug!(id = %id, "update aborted, fact not found");
            return Ok(None);
        }

        let embedding = self.embedder.embed(new_content).await?;
        let fact = StoredFact {
            id: Uuid::new_v4().to_string(),
            content: new_content.to_string(),
            embedding,
            created_at: now_timestamp(),
            metadata: None,
        };
        self.store.insert(&fact).await?;
        debug!(old_id = %id, new_id = %fact.id, "fact replaced");
        Ok(Some(fact.id))
    }

    /// Idempotent duplicate sweep: pairwise comparison among all facts,
    /// oldest first; the newer member of any pair at or above the threshold
    /// is deleted. Returns the number of removed facts.
    ///
    /// Safe to run concurrently with reads; callers must serialize writes.
    pub async fn cleanup_duplicates(&self) -> Result<usize, AmicaError> {
        let facts = self.store.all_oldest_first().await?;

        let mut doomed: Vec<String> = Vec::new();
        for i in 0..facts.len() {
            if doomed.contains(&facts[i].id) {
                continue;
            }
            for j in (i + 1)..facts.len() {
                if doomed.contains(&facts[j].id) {
                    continue;
                }
                if facts[i].embedding.len() != facts[j].embedding.len() {
                    continue;
                }
                let sim = cosine_similarity(&facts[i].embedding, &facts[j].embedding);
                if sim >= self.similarity_threshold {
                    // Oldest survivor: i precedes j in creation order.
                    doomed.push(facts[j].id.clone());
                }
            }
        }

        for id in &doomed {
            self.store.delete(id).await?;
        }
        if !doomed.is_empty() {
            info!(removed = doomed.len(), "duplicate facts removed");
        }
        Ok(doomed.len())
    }

    /// Row-level access, for wiring and tests.
    pub fn store(&self) -> &FactStore {
        &self.store
    }
}

/// Find the most similar embedding in the set. Entries whose dimensions do
/// not match the query are skipped.
fn find_most_similar(
    query: &[f32],
    embeddings: &[(String, Vec<f32>)],
) -> Option<(String, f32)> {
    embeddings
        .iter()
        .filter(|(_, emb)| emb.len() == query.len())
        .map(|(id, emb)| (id.clone(), cosine_similarity(query, emb)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
