// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for the Amica companion agent.
//!
//! Facts are stored in SQLite with their embedding vectors and retrieved by
//! cosine similarity. Insertion silently refuses near-duplicates, updates are
//! delete-then-reinsert under a fresh id, and an idempotent sweep removes
//! duplicate pairs keeping the oldest survivor.

pub mod embedder;
pub mod service;
pub mod store;
pub mod types;

pub use embedder::HttpEmbedder;
pub use service::MemoryService;
pub use store::FactStore;
pub use types::{StoredFact, cosine_similarity};
