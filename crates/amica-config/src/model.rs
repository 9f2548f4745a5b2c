// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Amica companion agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Amica configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AmicaConfig {
    /// Agent identity and personality settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Long-term memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Retry budgets for the orchestrator.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Chat context settings.
    #[serde(default)]
    pub chat: ChatContextConfig,

    /// Discord context settings.
    #[serde(default)]
    pub discord: DiscordContextConfig,
}

/// Agent identity and personality configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Primary personality system prompt.
    #[serde(default = "default_personality")]
    pub personality: String,

    /// Maximum number of messages kept in the conversation transcript.
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            personality: default_personality(),
            max_history_messages: default_max_history_messages(),
        }
    }
}

fn default_agent_name() -> String {
    "amica".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_personality() -> String {
    "You are Amica, a warm and helpful AI companion.".to_string()
}

fn default_max_history_messages() -> usize {
    20
}

/// LLM provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Provider identity: "openai" or "gemini".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier. `None` selects the provider's default model.
    #[serde(default)]
    pub model: Option<String>,

    /// Ordered API key list for OpenAI, consumed round-robin.
    #[serde(default)]
    pub openai_api_keys: Vec<String>,

    /// Ordered API key list for Gemini, consumed round-robin.
    #[serde(default)]
    pub gemini_api_keys: Vec<String>,

    /// Maximum tokens for final response generation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum tokens for structured decision calls.
    #[serde(default = "default_decision_max_tokens")]
    pub decision_max_tokens: u32,

    /// OpenAI API base URL.
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Gemini API base URL.
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            openai_api_keys: Vec::new(),
            gemini_api_keys: Vec::new(),
            max_tokens: default_max_tokens(),
            decision_max_tokens: default_decision_max_tokens(),
            openai_base_url: default_openai_base_url(),
            gemini_base_url: default_gemini_base_url(),
        }
    }
}

impl LlmConfig {
    /// The key list for the configured provider.
    pub fn api_keys(&self) -> &[String] {
        match self.provider.as_str() {
            "gemini" => &self.gemini_api_keys,
            _ => &self.openai_api_keys,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_max_tokens() -> u32 {
    450
}

fn default_decision_max_tokens() -> u32 {
    150
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

/// Long-term memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Whether the memory store is enabled. When disabled, memory tools
    /// remain registered but report the store as unavailable.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Cosine similarity at or above which two facts count as duplicates.
    /// Used for both insert-time dedup and the cleanup sweep.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Facts retrieved per turn for the memory context block.
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    /// Facts returned by the fetch_memory tool.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Base URL of the OpenAI-compatible embeddings endpoint.
    #[serde(default = "default_embedding_base_url")]
    pub embedding_base_url: String,

    /// API key for the embeddings endpoint. Falls back to the first
    /// OpenAI key when unset.
    #[serde(default)]
    pub embedding_api_key: Option<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: default_database_path(),
            similarity_threshold: default_similarity_threshold(),
            retrieval_limit: default_retrieval_limit(),
            fetch_limit: default_fetch_limit(),
            embedding_model: default_embedding_model(),
            embedding_base_url: default_embedding_base_url(),
            embedding_api_key: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_database_path() -> String {
    "amica.db".to_string()
}

fn default_similarity_threshold() -> f64 {
    0.95
}

fn default_retrieval_limit() -> usize {
    3
}

fn default_fetch_limit() -> usize {
    5
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com".to_string()
}

/// Retry budgets shared by the orchestrator's retry sites.
///
/// Semantics for each budget: `0` disables retries (first failure is
/// terminal), `-1` means unbounded, positive `N` permits N retries after
/// the initial attempt.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries for the tool-selection decision call.
    #[serde(default = "default_tool_select_retry")]
    pub tool_select_retry: i64,

    /// Retries for argument generation + execution of a chosen tool.
    #[serde(default = "default_tool_use_retry")]
    pub tool_use_retry: i64,

    /// Retries for the final memory-write step.
    #[serde(default = "default_final_memory_retry")]
    pub final_memory_retry: i64,

    /// Base delay between retry attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            tool_select_retry: default_tool_select_retry(),
            tool_use_retry: default_tool_use_retry(),
            final_memory_retry: default_final_memory_retry(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_tool_select_retry() -> i64 {
    5
}

fn default_tool_use_retry() -> i64 {
    10
}

fn default_final_memory_retry() -> i64 {
    10
}

fn default_retry_delay_secs() -> u64 {
    2
}

/// Chat context configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatContextConfig {
    /// Allowed tools for the chat context. `None` allows all registered tools.
    #[serde(default)]
    pub allowed_tools: Option<Vec<String>>,

    /// Maximum tool-loop iterations per turn.
    #[serde(default = "default_chat_max_tool_calls")]
    pub max_tool_calls: usize,
}

impl Default for ChatContextConfig {
    fn default() -> Self {
        Self {
            allowed_tools: None,
            max_tool_calls: default_chat_max_tool_calls(),
        }
    }
}

fn default_chat_max_tool_calls() -> usize {
    5
}

/// Discord context configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordContextConfig {
    /// Allowed tools for the Discord context.
    #[serde(default = "default_discord_allowed_tools")]
    pub allowed_tools: Option<Vec<String>>,

    /// Maximum tool-loop iterations per turn.
    #[serde(default = "default_discord_max_tool_calls")]
    pub max_tool_calls: usize,

    /// User id granted the master personality.
    #[serde(default)]
    pub master_user_id: Option<String>,

    /// Personality used when talking to the master user. Falls back to the
    /// agent personality when unset.
    #[serde(default)]
    pub personality_to_master: Option<String>,

    /// Prefix of the stranger personality; the user's display name is
    /// inserted between prefix and suffix.
    #[serde(default = "default_stranger_prefix")]
    pub stranger_personality_prefix: String,

    /// Suffix of the stranger personality.
    #[serde(default = "default_stranger_suffix")]
    pub stranger_personality_suffix: String,
}

impl Default for DiscordContextConfig {
    fn default() -> Self {
        Self {
            allowed_tools: default_discord_allowed_tools(),
            max_tool_calls: default_discord_max_tool_calls(),
            master_user_id: None,
            personality_to_master: None,
            stranger_personality_prefix: default_stranger_prefix(),
            stranger_personality_suffix: default_stranger_suffix(),
        }
    }
}

fn default_discord_allowed_tools() -> Option<Vec<String>> {
    Some(vec![
        "fetch_memory".to_string(),
        "save_memory".to_string(),
        "update_memory".to_string(),
        "search_web".to_string(),
        "get_current_time".to_string(),
    ])
}

fn default_discord_max_tool_calls() -> usize {
    3
}

fn default_stranger_prefix() -> String {
    "You are a polite AI companion. You are talking to ".to_string()
}

fn default_stranger_suffix() -> String {
    ". Address them politely.".to_string()
}
