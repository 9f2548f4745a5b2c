// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Amica companion agent.

use thiserror::Error;

/// Classifies a provider failure for the key-rotation policy.
///
/// The LLM client consults this when deciding whether the same request
/// is worth retrying against the next API key in the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Quota exhausted or rate limited on the current key.
    RateLimit,
    /// Authentication or permission failure on the current key.
    PermissionDenied,
    /// Transport-level failure (connect, timeout, read).
    Transport,
    /// The model returned an empty or unparseable payload.
    InvalidResponse,
    /// Definitively fatal (malformed request, unsupported provider).
    Fatal,
}

impl ProviderErrorKind {
    /// Whether failover to the next API key may help.
    pub fn rotates_key(self) -> bool {
        !matches!(self, ProviderErrorKind::Fatal)
    }
}

/// The primary error type used across the Amica workspace.
#[derive(Debug, Error)]
pub enum AmicaError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM provider errors, carrying the failover classification.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        kind: ProviderErrorKind,
    },

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding backend errors.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Tool implementation errors.
    #[error("tool error: {message}")]
    Tool { message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AmicaError {
    /// Shorthand for a classified provider error.
    pub fn provider(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        AmicaError::Provider {
            message: message.into(),
            kind,
        }
    }

    /// The failover classification, if this is a provider error.
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            AmicaError::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
