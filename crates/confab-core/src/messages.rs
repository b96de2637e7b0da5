//! Chat message types and wire frames.
//!
//! The wire format is `snake_case` JSON. A message's `message_type` and
//! `linked_tool_ids` fields are opaque metadata: the server relays them
//! untouched and never branches on their contents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Role
// ─────────────────────────────────────────────────────────────────────────────

/// Author role of a chat message.
///
/// Only [`ChatRole::User`] messages trigger an assistant reply; replies to
/// assistant or system messages would loop forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// A human participant.
    User,
    /// The generated reply author.
    Assistant,
    /// Server- or operator-injected message.
    System,
}

impl ChatRole {
    /// Role string as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted chat message.
///
/// Immutable once created: the server only ever appends new messages
/// (including assistant replies), never rewrites existing ones. `id` and
/// `created_at` are assigned by the store at append time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID (UUIDv7, time-ordered).
    pub id: Uuid,
    /// Session this message belongs to; all routing keys off this.
    pub session_id: Uuid,
    /// Author role.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
    /// Assigned at persistence time.
    pub created_at: DateTime<Utc>,
    /// Opaque message subtype tag.
    pub message_type: i32,
    /// Opaque linked references.
    #[serde(default)]
    pub linked_tool_ids: Vec<Uuid>,
}

/// Inbound message payload, before the store assigns `id`/`created_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewChatMessage {
    /// Session the message is addressed to.
    pub session_id: Uuid,
    /// Author role.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
    /// Opaque message subtype tag.
    #[serde(default)]
    pub message_type: i32,
    /// Opaque linked references.
    #[serde(default)]
    pub linked_tool_ids: Vec<Uuid>,
}

impl NewChatMessage {
    /// Build a plain text message with no metadata.
    pub fn text(session_id: Uuid, role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            session_id,
            role,
            content: content.into(),
            message_type: 0,
            linked_tool_ids: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire frames
// ─────────────────────────────────────────────────────────────────────────────

/// Completion marker sent after an assistant reply has been broadcast.
///
/// Serializes to exactly `{"status":"finished"}`. Clients use it to stop
/// loading indicators and re-enable input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyFinished {
    /// Always `"finished"`.
    pub status: FinishedStatus,
}

/// The single allowed value of [`ReplyFinished::status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishedStatus {
    /// Reply sequence complete.
    Finished,
}

impl ReplyFinished {
    /// The marker frame.
    pub fn new() -> Self {
        Self {
            status: FinishedStatus::Finished,
        }
    }
}

impl Default for ReplyFinished {
    fn default() -> Self {
        Self::new()
    }
}
