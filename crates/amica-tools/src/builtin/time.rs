// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in current-time tool.

use amica_core::AmicaError;
use async_trait::async_trait;

use crate::tool::{Tool, ToolOutput};

/// Reports the current local date and time.
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Gets the current date and time."
    }

    fn instruction(&self) -> &str {
        "Indicate you want the current time. Respond with an empty JSON object {}."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn invoke(&self, _input: serde_json::Value) -> Result<ToolOutput, AmicaError> {
        let now = chrono::Local::now();
        Ok(ToolOutput::ok(now.format("%Y-%m-%d %H:%M:%S").to_string()))
    }
}
