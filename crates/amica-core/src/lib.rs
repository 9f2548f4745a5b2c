// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Amica companion agent.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Amica workspace. The LLM client, memory
//! store, tools, and orchestrator all build on the seams defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AmicaError, ProviderErrorKind};
pub use traits::{ChatBackend, ChatRequest, Embedder};
pub use types::{ChatMessage, ChatRole, RetrievedFact, ToolCallRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amica_error_has_all_variants() {
        let _config = AmicaError::Config("test".into());
        let _provider = AmicaError::provider(ProviderErrorKind::RateLimit, "test");
        let _storage = AmicaError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _embedding = AmicaError::Embedding("test".into());
        let _tool = AmicaError::Tool {
            message: "test".into(),
        };
        let _internal = AmicaError::Internal("test".into());
    }

    #[test]
    fn provider_kind_classification() {
        assert!(ProviderErrorKind::RateLimit.rotates_key());
        assert!(ProviderErrorKind::PermissionDenied.rotates_key());
        assert!(ProviderErrorKind::Transport.rotates_key());
        assert!(ProviderErrorKind::InvalidResponse.rotates_key());
        assert!(!ProviderErrorKind::Fatal.rotates_key());
    }

    #[test]
    fn provider_kind_accessor() {
        let err = AmicaError::provider(ProviderErrorKind::RateLimit, "limited");
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::RateLimit));

        let err = AmicaError::Internal("oops".into());
        assert_eq!(err.provider_kind(), None);
    }

    #[test]
    fn chat_role_round_trip() {
        for role in [ChatRole::User, ChatRole::Assistant, ChatRole::System] {
            let json = serde_json::to_string(&role).expect("should serialize");
            let parsed: ChatRole = serde_json::from_str(&json).expect("should deserialize");
            assert_eq!(role, parsed);
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn chat_message_constructors() {
        assert_eq!(ChatMessage::user("hi").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("hi").role, ChatRole::Assistant);
        assert_eq!(ChatMessage::system("hi").role, ChatRole::System);
        assert_eq!(ChatMessage::user("hello").content, "hello");
    }

    #[test]
    fn tool_call_record_serializes() {
        let record = ToolCallRecord {
            tool_name: "get_current_time".into(),
            arguments: serde_json::json!({}),
            result: "2026-03-01 12:00:00".into(),
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&record).expect("should serialize");
        assert_eq!(json["tool_name"], "get_current_time");
    }
}
