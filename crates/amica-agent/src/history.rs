// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded conversation transcript.

use amica_core::{ChatMessage, ChatRole};

/// Default maximum number of messages kept (user + assistant + system).
pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// Manages the conversation history for one orchestrator session.
///
/// The transcript is capped; when the cap is exceeded the oldest messages
/// are evicted first. Mutations happen only through [`add_message`] and
/// [`clear`].
///
/// [`add_message`]: HistoryManager::add_message
/// [`clear`]: HistoryManager::clear
#[derive(Debug, Clone)]
pub struct HistoryManager {
    messages: Vec<ChatMessage>,
    max_messages: usize,
}

impl HistoryManager {
    /// Creates a history manager with the given message cap.
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages: max_messages.max(1),
        }
    }

    /// Appends a message and trims the oldest entries past the cap.
    pub fn add_message(&mut self, role: ChatRole, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
        while self.messages.len() > self.max_messages {
            self.messages.remove(0);
        }
    }

    /// A copy of the current transcript, oldest first.
    pub fn get_history(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    /// Clears the transcript.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}
