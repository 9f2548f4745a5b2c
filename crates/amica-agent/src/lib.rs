// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation orchestration for the Amica companion agent.
//!
//! The [`Orchestrator`] drives one session's turns: memory retrieval, a
//! bounded tool loop with error-category-aware retries, an optional final
//! memory write, and final response generation. Context profiles supply the
//! per-surface personality and tool policy; the error analyzer turns tool
//! failures into targeted retry guidance.

pub mod context;
pub mod error_analyzer;
pub mod history;
pub mod orchestrator;
pub mod retry;

pub use context::{CTX_USER_ID, CTX_USER_NAME, ChatProfile, ContextProfile, DiscordProfile, TurnContext};
pub use error_analyzer::{ErrorAnalyzer, ErrorCategory, RetryStrategy};
pub use history::{DEFAULT_MAX_MESSAGES, HistoryManager};
pub use orchestrator::Orchestrator;
pub use retry::{RetryBudget, RetryPolicy};
