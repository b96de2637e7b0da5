//! Session lifecycle records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session accepts messages and connections.
    Active,
    /// Session has been archived; kept for history queries.
    Archived,
}

impl SessionStatus {
    /// Status string as stored and serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

/// A conversation context: the unit of message routing and membership.
///
/// Connection membership is ephemeral, in-memory state held by the server's
/// session registry; this record is only the durable shell (name, status,
/// creation time) that the REST surface manages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Assigned at creation time.
    pub created_at: DateTime<Utc>,
}
