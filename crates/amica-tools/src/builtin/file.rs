// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in file read/write tools.

use std::io::ErrorKind;
use std::path::Path;

use amica_core::AmicaError;
use async_trait::async_trait;

use crate::tool::{Tool, ToolOutput};

/// Reads the content of a file.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads the content of a specified file path."
    }

    fn instruction(&self) -> &str {
        "Provide the exact path of the file you want to read. Respond with a JSON object \
         containing the 'file_path' key. Example: {\"file_path\": \"/home/user/notes.txt\"}"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The full path to the file to be read."
                }
            },
            "required": ["file_path"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, AmicaError> {
        let path = input["file_path"].as_str().unwrap_or_default();

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(ToolOutput::ok(content)),
            Err(e) => Ok(match e.kind() {
                ErrorKind::NotFound => {
                    ToolOutput::error(format!("File not found at '{path}'."))
                }
                ErrorKind::PermissionDenied => {
                    ToolOutput::error(format!("Permission denied to read file '{path}'."))
                }
                ErrorKind::IsADirectory => {
                    ToolOutput::error(format!("Path '{path}' is a directory, not a file."))
                }
                _ => ToolOutput::error(format!("Could not read file '{path}'. {e}")),
            }),
        }
    }
}

/// Writes content to a file, creating parent directories as needed.
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a specified file path. Overwrites the file if it exists, creates directories if they don't exist."
    }

    fn instruction(&self) -> &str {
        "Provide the exact path of the file you want to write to and the full content to write. \
         Respond with a JSON object containing the 'file_path' and 'content' keys. \
         Example: {\"file_path\": \"/home/user/new_notes.txt\", \"content\": \"This is the content of the file.\"}"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The full path to the file to be written."
                },
                "content": {
                    "type": "string",
                    "description": "The full content to write into the file."
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, AmicaError> {
        let path = input["file_path"].as_str().unwrap_or_default();
        let content = input["content"].as_str().unwrap_or_default();

        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Ok(ToolOutput::error(format!(
                    "Could not create directories for '{path}'. {e}"
                )));
            }
        }

        match tokio::fs::write(path, content).await {
            Ok(()) => Ok(ToolOutput::ok(format!(
                "Successfully wrote content to '{path}'."
            ))),
            Err(e) => Ok(match e.kind() {
                ErrorKind::PermissionDenied => {
                    ToolOutput::error(format!("Permission denied to write file '{path}'."))
                }
                _ => ToolOutput::error(format!("Could not write file '{path}'. {e}")),
            }),
        }
    }
}
