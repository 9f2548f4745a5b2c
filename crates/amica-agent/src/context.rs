// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-surface context profiles.
//!
//! A profile supplies everything that varies between calling surfaces:
//! base system messages (personality first), the allowed-tool list, the
//! per-context tool-call ceiling, and an optional user-message transform.
//! The turn state machine itself never inspects the context map.

use std::collections::HashMap;

use amica_config::model::DiscordContextConfig;
use amica_core::ChatMessage;

/// Caller-supplied context fields, opaque to the orchestrator core.
pub type TurnContext = HashMap<String, serde_json::Value>;

/// Context key: stable user identifier.
pub const CTX_USER_ID: &str = "user_id";
/// Context key: user display name.
pub const CTX_USER_NAME: &str = "user_name";

/// Everything the orchestrator needs to know about its calling surface.
pub trait ContextProfile: Send + Sync {
    /// Identifier for logging ("chat", "discord").
    fn name(&self) -> &str;

    /// Base system messages. The first entry is the primary personality;
    /// the rest carry ambient context such as the current date and time.
    fn base_system_messages(&self, ctx: &TurnContext) -> Vec<ChatMessage>;

    /// Tools this surface may use. `None` allows all registered tools.
    fn allowed_tools(&self) -> Option<Vec<String>>;

    /// Maximum main-loop tool calls per turn.
    fn max_tool_calls(&self) -> usize;

    /// Transform the user message before it enters history.
    fn prepare_user_message(&self, user_message: &str, _ctx: &TurnContext) -> String {
        user_message.to_string()
    }
}

fn current_datetime_message() -> ChatMessage {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    ChatMessage::system(format!("Current date and time: {now}"))
}

fn ctx_str<'a>(ctx: &'a TurnContext, key: &str) -> Option<&'a str> {
    ctx.get(key).and_then(serde_json::Value::as_str)
}

/// Profile for the desktop chat surface: one personality, all tools.
pub struct ChatProfile {
    personality: String,
    allowed_tools: Option<Vec<String>>,
    max_tool_calls: usize,
}

impl ChatProfile {
    pub fn new(
        personality: impl Into<String>,
        allowed_tools: Option<Vec<String>>,
        max_tool_calls: usize,
    ) -> Self {
        Self {
            personality: personality.into(),
            allowed_tools,
            max_tool_calls,
        }
    }
}

impl ContextProfile for ChatProfile {
    fn name(&self) -> &str {
        "chat"
    }

    fn base_system_messages(&self, _ctx: &TurnContext) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.personality.clone()),
            current_datetime_message(),
        ]
    }

    fn allowed_tools(&self) -> Option<Vec<String>> {
        self.allowed_tools.clone()
    }

    fn max_tool_calls(&self) -> usize {
        self.max_tool_calls
    }
}

/// Profile for the Discord surface.
///
/// The personality depends on who is talking: the configured master user
/// gets the master personality, everyone else gets the stranger personality
/// assembled around their display name. The user's name is prepended to the
/// message so the transcript reads naturally in multi-user channels.
pub struct DiscordProfile {
    config: DiscordContextConfig,
    fallback_personality: String,
}

impl DiscordProfile {
    pub fn new(config: DiscordContextConfig, fallback_personality: impl Into<String>) -> Self {
        Self {
            config,
            fallback_personality: fallback_personality.into(),
        }
    }

    fn is_master(&self, ctx: &TurnContext) -> bool {
        match (&self.config.master_user_id, ctx_str(ctx, CTX_USER_ID)) {
            (Some(master), Some(user)) => master == user,
            _ => false,
        }
    }

    fn personality_for(&self, ctx: &TurnContext) -> String {
        if self.is_master(ctx) {
            self.config
                .personality_to_master
                .clone()
                .unwrap_or_else(|| self.fallback_personality.clone())
        } else {
            let name = ctx_str(ctx, CTX_USER_NAME).unwrap_or("User");
            format!(
                "{}{}{}",
                self.config.stranger_personality_prefix,
                name,
                self.config.stranger_personality_suffix
            )
        }
    }
}

impl ContextProfile for DiscordProfile {
    fn name(&self) -> &str {
        "discord"
    }

    fn base_system_messages(&self, ctx: &TurnContext) -> Vec<ChatMessage> {
        let name = ctx_str(ctx, CTX_USER_NAME).unwrap_or("User");
        let id = ctx_str(ctx, CTX_USER_ID).unwrap_or("unknown");
        let relation = if self.is_master(ctx) {
            "They are your master."
        } else {
            "They are not your master."
        };
        vec![
            ChatMessage::system(self.personality_for(ctx)),
            current_datetime_message(),
            ChatMessage::system(format!(
                "You are interacting with user '{name}' (id: {id}). {relation}"
            )),
        ]
    }

    fn allowed_tools(&self) -> Option<Vec<String>> {
        self.config.allowed_tools.clone()
    }

    fn max_tool_calls(&self) -> usize {
        self.config.max_tool_calls
    }

    fn prepare_user_message(&self, user_message: &str, ctx: &TurnContext) -> String {
        let name = ctx_str(ctx, CTX_USER_NAME).unwrap_or("User");
        format!("{name} said: {user_message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discord_config() -> DiscordContextConfig {
        DiscordContextConfig {
            master_user_id: Some("42".to_string()),
            personality_to_master: Some("You are talking to your favorite person.".to_string()),
            ..Default::default()
        }
    }

    fn ctx(id: &str, name: &str) -> TurnContext {
        let mut ctx = TurnContext::new();
        ctx.insert(CTX_USER_ID.to_string(), serde_json::json!(id));
        ctx.insert(CTX_USER_NAME.to_string(), serde_json::json!(name));
        ctx
    }

    #[test]
    fn chat_profile_leads_with_personality() {
        let profile = ChatProfile::new("You are Amica.", None, 5);
        let messages = profile.base_system_messages(&TurnContext::new());
        assert_eq!(messages[0].content, "You are Amica.");
        assert!(messages[1].content.starts_with("Current date and time:"));
        assert!(profile.allowed_tools().is_none());
        assert_eq!(profile.max_tool_calls(), 5);
    }

    #[test]
    fn chat_profile_keeps_message_unchanged() {
        let profile = ChatProfile::new("p", None, 5);
        assert_eq!(
            profile.prepare_user_message("hello", &TurnContext::new()),
            "hello"
        );
    }

    #[test]
    fn discord_master_gets_master_personality() {
        let profile = DiscordProfile::new(discord_config(), "fallback");
        let messages = profile.base_system_messages(&ctx("42", "Sam"));
        assert_eq!(messages[0].content, "You are talking to your favorite person.");
        assert!(messages[2].content.contains("They are your master."));
    }

    #[test]
    fn discord_stranger_gets_assembled_personality() {
        let profile = DiscordProfile::new(discord_config(), "fallback");
        let messages = profile.base_system_messages(&ctx("7", "Robin"));
        assert!(messages[0].content.contains("Robin"));
        assert!(messages[2].content.contains("They are not your master."));
    }

    #[test]
    fn discord_prepends_user_name_to_message() {
        let profile = DiscordProfile::new(discord_config(), "fallback");
        assert_eq!(
            profile.prepare_user_message("hi there", &ctx("7", "Robin")),
            "Robin said: hi there"
        );
    }

    #[test]
    fn discord_restricts_tools_by_default() {
        let profile = DiscordProfile::new(DiscordContextConfig::default(), "fallback");
        let allowed = profile.allowed_tools().expect("discord has an allow-list");
        assert!(allowed.contains(&"search_web".to_string()));
        assert!(!allowed.contains(&"read_file".to_string()));
        assert_eq!(profile.max_tool_calls(), 3);
    }

    #[test]
    fn missing_master_config_treats_everyone_as_stranger() {
        let mut config = discord_config();
        config.master_user_id = None;
        let profile = DiscordProfile::new(config, "fallback");
        let messages = profile.base_system_messages(&ctx("42", "Sam"));
        assert!(messages[2].content.contains("They are not your master."));
    }
}
