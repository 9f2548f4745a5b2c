// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt-facing views of tool definitions.
//!
//! The client needs only a name/description pair to offer a tool as a
//! choice, and a name/instruction/schema triple to generate its arguments.
//! Keeping these as standalone structs avoids coupling the client to the
//! tool registry.

use serde::Deserialize;

/// A tool offered to the model during action selection.
#[derive(Debug, Clone)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

impl ToolSummary {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Everything the client needs to prompt for a tool's arguments.
#[derive(Debug, Clone)]
pub struct ArgumentPrompt {
    /// Tool name, used in the prompt and error messages.
    pub tool_name: String,
    /// The tool's documented argument format, including an example.
    pub instruction: String,
    /// JSON Schema for the expected argument object.
    pub schema: serde_json::Value,
}

/// Wire shape of the model's tool-choice decision.
#[derive(Debug, Deserialize)]
pub(crate) struct ToolChoiceWire {
    pub tool_name: Option<String>,
}
