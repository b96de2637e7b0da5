//! High-level [`ChatStore`] API.
//!
//! The gateway and dispatcher are written against the trait, never the
//! `SQLite` type, so tests can swap in scripted stores (including failing
//! ones — a failed append is a first-class path in the protocol).

use async_trait::async_trait;
use confab_core::{ChatMessage, NewChatMessage, Session};
use uuid::Uuid;

use crate::connection::{ConnectionPool, PooledConnection};
use crate::errors::Result;
use crate::repositories::{MessageRepo, SessionRepo};

/// Persistence seam for messages and sessions.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Append a message, assigning its `id` and `created_at`.
    async fn append_message(&self, new: NewChatMessage) -> Result<ChatMessage>;

    /// List a session's messages, ascending `created_at`.
    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>>;

    /// Create a new active session.
    async fn create_session(&self, name: &str) -> Result<Session>;

    /// List all sessions.
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Delete a session by id (no-op if unknown).
    async fn delete_session(&self, id: Uuid) -> Result<()>;
}

/// `SQLite`-backed [`ChatStore`] over a connection pool.
pub struct SqliteChatStore {
    pool: ConnectionPool,
}

impl SqliteChatStore {
    /// Wrap an already-migrated connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn append_message(&self, new: NewChatMessage) -> Result<ChatMessage> {
        MessageRepo::append(&*self.conn()?, &new)
    }

    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>> {
        MessageRepo::list_for_session(&*self.conn()?, session_id)
    }

    async fn create_session(&self, name: &str) -> Result<Session> {
        SessionRepo::create(&*self.conn()?, name)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        SessionRepo::list(&*self.conn()?)
    }

    async fn delete_session(&self, id: Uuid) -> Result<()> {
        SessionRepo::delete(&*self.conn()?, id)
    }

}
