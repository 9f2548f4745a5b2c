// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool-failure classification and retry guidance.
//!
//! Turns an opaque `"Error: ..."` result string plus the tool name and
//! arguments into a category, targeted natural-language guidance for the
//! next retry prompt, and a retry recommendation.

use regex::Regex;
use serde_json::Value;
use strum::{Display, EnumString};

/// Categories a tool failure can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    InvalidArgument,
    MissingArgument,
    MemoryIdError,
    PermissionDenied,
    ResourceNotFound,
    NetworkError,
    RateLimit,
    ValidationError,
    ToolExecution,
    Unknown,
}

/// Recommended handling for the next retry of a failed tool call.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Whether retrying is worthwhile at all.
    pub should_retry: bool,
    /// Multiplier applied to the base retry delay.
    pub delay_multiplier: f64,
    /// Whether arguments should be regenerated rather than reused.
    pub regenerate_args: bool,
    /// Extra instructions worth surfacing in the retry prompt.
    pub notes: Vec<String>,
}

/// Analyzes tool execution errors and produces targeted retry guidance.
///
/// Classification is pattern matching over the lower-cased error text; the
/// rule table is ordered and the first match wins, defaulting to `Unknown`.
pub struct ErrorAnalyzer {
    rules: Vec<(ErrorCategory, Vec<Regex>)>,
}

impl ErrorAnalyzer {
    pub fn new() -> Self {
        let table: &[(ErrorCategory, &[&str])] = &[
            (
                ErrorCategory::InvalidArgument,
                &[
                    r"invalid argument",
                    r"invalid value",
                    r"argument.*invalid",
                    r"invalid.*parameter",
                ],
            ),
            (
                ErrorCategory::MissingArgument,
                &[
                    r"missing.*argument",
                    r"required.*argument",
                    r"argument.*required",
                    r"missing.*parameter",
                    r"is a required property",
                ],
            ),
            (
                ErrorCategory::MemoryIdError,
                &[
                    r"memory_id.*not found",
                    r"invalid.*memory_id",
                    r"memory replacement failed",
                ],
            ),
            (
                ErrorCategory::PermissionDenied,
                &[
                    r"permission denied",
                    r"access denied",
                    r"unauthorized",
                    r"forbidden",
                ],
            ),
            (
                ErrorCategory::ResourceNotFound,
                &[
                    r"file not found",
                    r"path.*not found",
                    r"resource.*not found",
                    r"does not exist",
                ],
            ),
            (
                ErrorCategory::NetworkError,
                &[
                    r"network error",
                    r"connection failed",
                    r"timeout",
                    r"unreachable",
                ],
            ),
            (
                ErrorCategory::RateLimit,
                &[r"rate limit", r"too many requests", r"quota exceeded"],
            ),
            (
                ErrorCategory::ValidationError,
                &[r"validation failed", r"schema.*violat"],
            ),
        ];

        let rules = table
            .iter()
            .map(|(category, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p).expect("hardcoded pattern is valid"))
                    .collect();
                (*category, compiled)
            })
            .collect();

        Self { rules }
    }

    /// Classify an error message and produce guidance for the retry prompt.
    pub fn analyze(
        &self,
        error_message: &str,
        tool_name: &str,
        arguments: &serde_json::Map<String, Value>,
    ) -> (ErrorCategory, String) {
        let error_lower = error_message.to_lowercase();

        for (category, patterns) in &self.rules {
            for pattern in patterns {
                if pattern.is_match(&error_lower) {
                    let guidance =
                        self.guidance(*category, error_message, tool_name, arguments);
                    return (*category, guidance);
                }
            }
        }

        let guidance =
            self.guidance(ErrorCategory::Unknown, error_message, tool_name, arguments);
        (ErrorCategory::Unknown, guidance)
    }

    /// Whether retrying with the same arguments might succeed.
    ///
    /// Argument, id, permission, and not-found failures need corrected
    /// input, not a bare retry.
    pub fn should_retry_with_same_arguments(&self, category: ErrorCategory) -> bool {
        !matches!(
            category,
            ErrorCategory::InvalidArgument
                | ErrorCategory::MissingArgument
                | ErrorCategory::MemoryIdError
                | ErrorCategory::ResourceNotFound
                | ErrorCategory::PermissionDenied
        )
    }

    /// Recommended retry strategy given the category and how many retries
    /// have already been spent on this tool call.
    ///
    /// Memory-id and argument failures stop resolving themselves; they are
    /// abandoned after 2 and 3 retries respectively, regardless of the
    /// configured budget.
    pub fn retry_strategy(&self, category: ErrorCategory, retries_done: u32) -> RetryStrategy {
        let mut strategy = RetryStrategy {
            should_retry: true,
            delay_multiplier: 1.0,
            regenerate_args: true,
            notes: Vec::new(),
        };

        match category {
            ErrorCategory::RateLimit => {
                strategy.delay_multiplier = 2.0 * f64::from(retries_done.max(1));
                strategy.regenerate_args = false;
                strategy
                    .notes
                    .push("Rate limited - waiting longer before retry".to_string());
            }
            ErrorCategory::NetworkError => {
                strategy.delay_multiplier = 1.5;
                strategy.regenerate_args = retries_done >= 2;
            }
            ErrorCategory::InvalidArgument
            | ErrorCategory::MissingArgument
            | ErrorCategory::ValidationError => {
                strategy
                    .notes
                    .push("Carefully review and fix the argument structure".to_string());
                if retries_done >= 3 {
                    strategy.should_retry = false;
                }
            }
            ErrorCategory::MemoryIdError => {
                strategy
                    .notes
                    .push("Use a valid memory_id from retrieved facts".to_string());
                if retries_done >= 2 {
                    strategy.should_retry = false;
                }
            }
            _ => {}
        }

        strategy
    }

    fn guidance(
        &self,
        category: ErrorCategory,
        error_message: &str,
        tool_name: &str,
        arguments: &serde_json::Map<String, Value>,
    ) -> String {
        let base = format!("Tool '{tool_name}' failed. ");

        match category {
            ErrorCategory::InvalidArgument | ErrorCategory::ValidationError => {
                let invalid = extract_invalid_arguments(error_message, arguments);
                if invalid.is_empty() {
                    format!(
                        "{base}Invalid argument format detected. Review the tool's parameter \
                         requirements and ensure all arguments match the expected data types \
                         and constraints."
                    )
                } else {
                    format!(
                        "{base}Invalid argument(s) detected: {}. Check the tool's schema and \
                         ensure values match the expected format and constraints. Previous \
                         arguments: {}",
                        invalid.join(", "),
                        Value::Object(arguments.clone())
                    )
                }
            }
            ErrorCategory::MissingArgument => {
                let provided: Vec<&str> = arguments.keys().map(String::as_str).collect();
                format!(
                    "{base}Required argument(s) missing. Check the tool definition for all \
                     required parameters. You provided: {}",
                    if provided.is_empty() {
                        "no arguments".to_string()
                    } else {
                        provided.join(", ")
                    }
                )
            }
            ErrorCategory::MemoryIdError => {
                format!(
                    "{base}Invalid memory_id provided. The id does not exist in the store. \
                     If updating memory, use a valid id from previously retrieved facts. \
                     If saving new information, use 'save_memory' instead of 'update_memory'."
                )
            }
            ErrorCategory::PermissionDenied => {
                format!(
                    "{base}Permission denied. Check that the file or resource exists and is \
                     accessible. Consider using a different path."
                )
            }
            ErrorCategory::ResourceNotFound => {
                let target = arguments
                    .get("file_path")
                    .or_else(|| arguments.get("path"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown resource");
                format!(
                    "{base}Resource not found. Verify the path or name is correct and the \
                     resource exists. You tried to access: {target}"
                )
            }
            ErrorCategory::NetworkError => {
                let target = arguments
                    .get("url")
                    .or_else(|| arguments.get("query"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown target");
                format!(
                    "{base}Network error occurred. This may be temporary. If retrying, ensure \
                     the target is correct. Target: {target}"
                )
            }
            ErrorCategory::RateLimit => {
                format!(
                    "{base}Rate limit exceeded. This is a temporary issue with the external \
                     service. Consider waiting or using an alternative approach."
                )
            }
            _ => {
                format!(
                    "{base}Execution error: {error_message}. Review the error message carefully \
                     and adjust your approach. Arguments used: {}",
                    Value::Object(arguments.clone())
                )
            }
        }
    }
}

impl Default for ErrorAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Argument names the error message mentions, as a hint for which values
/// were rejected.
fn extract_invalid_arguments(
    error_message: &str,
    arguments: &serde_json::Map<String, Value>,
) -> Vec<String> {
    let error_lower = error_message.to_lowercase();
    arguments
        .keys()
        .filter(|name| error_lower.contains(&name.to_lowercase()))
        .cloned()
        .collect()
}
