// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./amica.toml` > `~/.config/amica/amica.toml` >
//! `/etc/amica/amica.toml` with environment variable overrides via `AMICA_`
//! prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::AmicaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/amica/amica.toml` (system-wide)
/// 3. `~/.config/amica/amica.toml` (user XDG config)
/// 4. `./amica.toml` (local directory)
/// 5. `AMICA_*` environment variables
pub fn load_config() -> Result<AmicaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AmicaConfig::default()))
        .merge(Toml::file("/etc/amica/amica.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("amica/amica.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("amica.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config file specification.
pub fn load_config_from_str(toml_content: &str) -> Result<AmicaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AmicaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AmicaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AmicaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `AMICA_LLM_OPENAI_API_KEYS`
/// must map to `llm.openai_api_keys`, not `llm.openai.api.keys`.
fn env_provider() -> Env {
    Env::prefixed("AMICA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: AMICA_MEMORY_DATABASE_PATH -> "memory_database_path"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("llm_", "llm.", 1)
            .replacen("memory_", "memory.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("chat_", "chat.", 1)
            .replacen("discord_", "discord.", 1);
        mapped.into()
    })
}
