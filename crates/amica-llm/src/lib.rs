// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM provider client for the Amica companion agent.
//!
//! Hides provider differences behind the [`amica_core::ChatBackend`] trait
//! (one concrete variant per provider) and multi-key round-robin failover
//! behind [`LlmClient`], which exposes the three operations the orchestrator
//! consumes: tool-choice decisions, tool-argument generation, and final
//! response generation.

pub mod client;
pub mod gemini;
pub mod openai;
pub mod types;

pub use client::LlmClient;
pub use gemini::{DEFAULT_GEMINI_MODEL, GeminiBackend};
pub use openai::{DEFAULT_OPENAI_MODEL, OpenAiBackend};
pub use types::{ArgumentPrompt, ToolSummary};
