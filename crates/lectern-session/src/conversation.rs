//! Conversation state: the message log, continuation token and streaming flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create the empty assistant placeholder filled in while streaming
    pub fn assistant_empty() -> Self {
        Self::assistant(String::new())
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Conversation state for one document.
///
/// Only the last message may be in progress; it is the assistant placeholder
/// appended at turn start and grows as content arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    /// Messages in display order
    pub messages: Vec<Message>,
    /// Continuation token for the next turn
    pub checkpoint_id: Option<String>,
    /// Whether a turn is currently streaming
    pub is_streaming: bool,
}

impl Conversation {
    /// Rebuild state from a saved record
    pub fn from_record(record: ConversationRecord) -> Self {
        Self {
            messages: record.messages,
            checkpoint_id: record.checkpoint_id,
            is_streaming: false,
        }
    }

    /// Snapshot the persisted part of the state
    pub fn to_record(&self) -> ConversationRecord {
        ConversationRecord {
            messages: self.messages.clone(),
            checkpoint_id: self.checkpoint_id.clone(),
            last_updated: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all messages and the continuation token
    pub fn clear(&mut self) {
        self.messages.clear();
        self.checkpoint_id = None;
        self.is_streaming = false;
    }

    /// The message being appended to, if the last one is an assistant message
    pub fn in_progress_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut().filter(|m| m.is_assistant())
    }
}

/// Serialized form of a conversation, keyed by document in a store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub checkpoint_id: Option<String>,
    pub last_updated: DateTime<Utc>,
}
