// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Amica companion agent.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and miette diagnostic error rendering.
//!
//! # Usage
//!
//! ```no_run
//! use amica_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Agent name: {}", config.agent.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::AmicaConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to diagnostic errors
///
/// Returns either a valid `AmicaConfig` or a list of diagnostic errors.
pub fn load_and_validate() -> Result<AmicaConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<AmicaConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_and_validate() {
        let config = load_and_validate_str("").expect("defaults should be valid");
        assert_eq!(config.agent.name, "amica");
        assert_eq!(config.agent.max_history_messages, 20);
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.memory.similarity_threshold, 0.95);
        assert_eq!(config.memory.retrieval_limit, 3);
        assert_eq!(config.retry.tool_select_retry, 5);
        assert_eq!(config.retry.tool_use_retry, 10);
        assert_eq!(config.retry.final_memory_retry, 10);
        assert_eq!(config.retry.retry_delay_secs, 2);
        assert_eq!(config.chat.max_tool_calls, 5);
        assert_eq!(config.discord.max_tool_calls, 3);
    }

    #[test]
    fn toml_overrides_defaults() {
        let toml = r#"
[agent]
name = "companion"
max_history_messages = 30

[llm]
provider = "gemini"
gemini_api_keys = ["key-a", "key-b"]

[retry]
tool_use_retry = 3
"#;
        let config = load_and_validate_str(toml).expect("should be valid");
        assert_eq!(config.agent.name, "companion");
        assert_eq!(config.agent.max_history_messages, 30);
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.api_keys(), &["key-a", "key-b"]);
        assert_eq!(config.retry.tool_use_retry, 3);
        // Untouched sections keep defaults.
        assert_eq!(config.retry.tool_select_retry, 5);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = load_and_validate_str("[agent]\nnam = \"typo\"");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_provider_is_rejected() {
        let result = load_and_validate_str("[llm]\nprovider = \"mystery\"");
        assert!(result.is_err());
    }

    #[test]
    fn api_keys_select_by_provider() {
        let toml = r#"
[llm]
provider = "openai"
openai_api_keys = ["oa-1"]
gemini_api_keys = ["gm-1"]
"#;
        let config = load_and_validate_str(toml).expect("should be valid");
        assert_eq!(config.llm.api_keys(), &["oa-1"]);
    }

    #[test]
    fn discord_defaults_restrict_tools() {
        let config = load_and_validate_str("").expect("defaults should be valid");
        let allowed = config.discord.allowed_tools.expect("discord has an allow-list");
        assert!(allowed.contains(&"fetch_memory".to_string()));
        assert!(allowed.contains(&"search_web".to_string()));
        assert!(!allowed.contains(&"write_file".to_string()));
        // Chat context allows everything by default.
        assert!(config.chat.allowed_tools.is_none());
    }
}
