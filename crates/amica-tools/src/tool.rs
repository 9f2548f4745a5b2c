// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait for built-in tools.
//!
//! The [`Tool`] trait defines the unified interface every tool implements.
//! The executor calls `invoke` with the JSON argument object produced by the
//! LLM after schema validation.

use amica_core::AmicaError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Output from a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The content returned by the tool (text output, JSON, etc.).
    pub content: String,
    /// Whether the tool invocation resulted in an error.
    pub is_error: bool,
}

impl ToolOutput {
    /// A successful output.
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// A failed output. The executor translates this into the
    /// `"Error: ..."` string convention.
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Unified trait for all tools.
///
/// Every tool provides a name, a description used when offering the tool as
/// a choice, an instruction with a documented argument example used when
/// prompting for arguments, a JSON Schema for validation, and an async
/// `invoke` method.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's unique name (used for lookup and prompting).
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the argument-format instruction shown to the model,
    /// including an example object.
    fn instruction(&self) -> &str;

    /// Returns the JSON Schema describing the tool's argument object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Invokes the tool with the validated JSON argument object.
    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, AmicaError>;
}
