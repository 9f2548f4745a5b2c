// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed fact store with vector BLOB storage.

use amica_core::AmicaError;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::types::{StoredFact, blob_to_vec, vec_to_blob};

/// Helper to convert tokio_rusqlite errors into AmicaError::Storage.
fn storage_err(e: tokio_rusqlite::Error) -> AmicaError {
    AmicaError::Storage {
        source: Box::new(e),
    }
}

/// Persistent store for fact rows in SQLite.
///
/// Stores embeddings as little-endian f32 BLOBs. Row-level operations only;
/// dedup and similarity policy live in [`crate::service::MemoryService`].
pub struct FactStore {
    conn: Connection,
}

impl FactStore {
    /// Opens (or creates) the store at the given path and applies the schema.
    pub async fn open(path: &str) -> Result<Self, AmicaError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| storage_err(e.into()))?;
        let store = Self { conn };
        store.init_schema().await?;
        Ok(store)
    }

    /// Opens an in-memory store. Used by tests and ephemeral sessions.
    pub async fn open_in_memory() -> Result<Self, AmicaError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| storage_err(e.into()))?;
        let store = Self { conn };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), AmicaError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS facts (
                        id TEXT PRIMARY KEY NOT NULL,
                        content TEXT NOT NULL,
                        embedding BLOB NOT NULL,
                        created_at TEXT NOT NULL,
                        metadata TEXT
                    );
                    CREATE INDEX IF NOT EXISTS idx_facts_created ON facts(created_at);",
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Insert a fact row.
    pub async fn insert(&self, fact: &StoredFact) -> Result<(), AmicaError> {
        let id = fact.id.clone();
        let content = fact.content.clone();
        let embedding_blob = vec_to_blob(&fact.embedding);
        let created_at = fact.created_at.clone();
        let metadata = fact.metadata.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO facts (id, content, embedding, created_at, metadata) VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![id, content, embedding_blob, created_at, metadata],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Get a fact by id.
    pub async fn get(&self, id: &str) -> Result<Option<StoredFact>, AmicaError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, content, embedding, created_at, metadata FROM facts WHERE id = ?1",
                )?;
                let fact = stmt
                    .query_row(rusqlite::params![id], |row| Ok(row_to_fact(row)))
                    .optional()?;
                Ok(fact)
            })
            .await
            .map_err(storage_err)
    }

    /// Delete a fact by id. Returns true when a row was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, AmicaError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let changed = conn.execute("DELETE FROM facts WHERE id = ?1", rusqlite::params![id])?;
                Ok(changed > 0)
            })
            .await
            .map_err(storage_err)
    }

    /// All fact embeddings (lightweight, no content), as (id, embedding) pairs.
    pub async fn all_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>, AmicaError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT id, embedding FROM facts")?;
                let results = stmt
                    .query_map([], |row| {
                        let id: String = row.get(0)?;
                        let blob: Vec<u8> = row.get(1)?;
                        Ok((id, blob_to_vec(&blob)))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(results)
            })
            .await
            .map_err(storage_err)
    }

    /// All facts, oldest first. Used by the duplicate sweep.
    pub async fn all_oldest_first(&self) -> Result<Vec<StoredFact>, AmicaError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, content, embedding, created_at, metadata FROM facts ORDER BY created_at ASC, id ASC",
                )?;
                let facts = stmt
                    .query_map([], |row| Ok(row_to_fact(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(facts)
            })
            .await
            .map_err(storage_err)
    }

    /// Number of stored facts.
    pub async fn count(&self) -> Result<usize, AmicaError> {
        self.conn
            .call(move |conn| {
                let n: i64 = conn.query_row("SELECT COUNT(*) FROM facts", [], |row| row.get(0))?;
                Ok(n as usize)
            })
            .await
            .map_err(storage_err)
    }
}

/// Convert a rusqlite Row to a StoredFact.
fn row_to_fact(row: &rusqlite::Row) -> StoredFact {
    let embedding_blob: Vec<u8> = row.get(2).unwrap_or_default();
    StoredFact {
        id: row.get(0).unwrap_or_default(),
        content: row.get(1).unwrap_or_default(),
        embedding: blob_to_vec(&embedding_blob),
        created_at: row.get(3).unwrap_or_default(),
        metadata: row.get(4).unwrap_or(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fact(id: &str, content: &str, created_at: &str) -> StoredFact {
        StoredFact {
            id: id.to_string(),
            content: content.to_string(),
            embedding: vec![0.1; 8],
            created_at: created_at.to_string(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = FactStore::open_in_memory().await.unwrap();
        let fact = make_fact("fact-1", "User's dog is named Max", "2026-03-01T00:00:00.000Z");
        store.insert(&fact).await.unwrap();

        let retrieved = store.get("fact-1").await.unwrap().unwrap();
        assert_eq!(retrieved.id, "fact-1");
        assert_eq!(retrieved.content, "User's dog is named Max");
        assert_eq!(retrieved.embedding.len(), 8);
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let store = FactStore::open_in_memory().await.unwrap();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_row_presence() {
        let store = FactStore::open_in_memory().await.unwrap();
        store
            .insert(&make_fact("fact-1", "content", "2026-03-01T00:00:00.000Z"))
            .await
            .unwrap();

        assert!(store.delete("fact-1").await.unwrap());
        assert!(!store.delete("fact-1").await.unwrap());
        assert!(store.get("fact-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn embedding_blob_roundtrip() {
        let store = FactStore::open_in_memory().await.unwrap();
        let embedding: Vec<f32> = (0..16).map(|i| i as f32 / 16.0).collect();
        let mut fact = make_fact("fact-1", "embedding test", "2026-03-01T00:00:00.000Z");
        fact.embedding = embedding.clone();
        store.insert(&fact).await.unwrap();

        let retrieved = store.get("fact-1").await.unwrap().unwrap();
        for (a, b) in embedding.iter().zip(retrieved.embedding.iter()) {
            assert!((a - b).abs() < f32::EPSILON);
        }
    }

    #[tokio::test]
    async fn all_oldest_first_ordering() {
        let store = FactStore::open_in_memory().await.unwrap();
        store
            .insert(&make_fact("b", "second", "2026-03-02T00:00:00.000Z"))
            .await
            .unwrap();
        store
            .insert(&make_fact("a", "first", "2026-03-01T00:00:00.000Z"))
            .await
            .unwrap();

        let facts = store.all_oldest_first().await.unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].id, "a");
        assert_eq!(facts[1].id, "b");
    }

    #[tokio::test]
    async fn all_embeddings_and_count() {
        let store = FactStore::open_in_memory().await.unwrap();
        store
            .insert(&make_fact("fact-1", "one", "2026-03-01T00:00:00.000Z"))
            .await
            .unwrap();
        store
            .insert(&make_fact("fact-2", "two", "2026-03-01T00:00:01.000Z"))
            .await
            .unwrap();

        let embeddings = store.all_embeddings().await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn metadata_roundtrip() {
        let store = FactStore::open_in_memory().await.unwrap();
        let mut fact = make_fact("fact-1", "with metadata", "2026-03-01T00:00:00.000Z");
        fact.metadata = Some("{\"origin\":\"chat\"}".to_string());
        store.insert(&fact).await.unwrap();

        let retrieved = store.get("fact-1").await.unwrap().unwrap();
        assert_eq!(retrieved.metadata.as_deref(), Some("{\"origin\":\"chat\"}"));
    }
}
