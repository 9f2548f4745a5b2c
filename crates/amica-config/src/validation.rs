// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as known provider names and sane retry budgets.

use crate::diagnostic::ConfigError;
use crate::model::AmicaConfig;

/// Providers the LLM client knows how to construct.
const KNOWN_PROVIDERS: &[&str] = &["openai", "gemini"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AmicaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !KNOWN_PROVIDERS.contains(&config.llm.provider.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "llm.provider `{}` is not supported (expected one of: {})",
                config.llm.provider,
                KNOWN_PROVIDERS.join(", ")
            ),
        });
    }

    if config.agent.max_history_messages == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.max_history_messages must be at least 1".to_string(),
        });
    }

    let threshold = config.memory.similarity_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        errors.push(ConfigError::Validation {
            message: format!(
                "memory.similarity_threshold must be in (0, 1], got {threshold}"
            ),
        });
    }

    if config.memory.retrieval_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.retrieval_limit must be at least 1".to_string(),
        });
    }

    if config.memory.enabled && config.memory.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "memory.database_path must not be empty when memory is enabled"
                .to_string(),
        });
    }

    for (name, value) in [
        ("retry.tool_select_retry", config.retry.tool_select_retry),
        ("retry.tool_use_retry", config.retry.tool_use_retry),
        ("retry.final_memory_retry", config.retry.final_memory_retry),
    ] {
        if value < -1 {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be -1 (unbounded), 0 (disabled), or positive, got {value}"),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
