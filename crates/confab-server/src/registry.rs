//! Session membership registry.
//!
//! The only shared mutable state in the real-time core. All access goes
//! through one `RwLock`; critical sections only touch the map — no I/O
//! happens while the lock is held. Broadcasters work from a copy-on-read
//! [`snapshot`](SessionRegistry::snapshot), so membership changes during a
//! fan-out never tear a broadcast in half.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::connection::ClientConnection;

/// Maps session IDs to the connections currently subscribed to them.
///
/// Constructed once at startup and injected into the gateway and the
/// dispatcher — never process-global, so tests can run any number of
/// independent registries.
pub struct SessionRegistry {
    /// session id → (connection id → handle)
    sessions: RwLock<HashMap<String, HashMap<String, Arc<ClientConnection>>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection under its session, creating the set if absent.
    ///
    /// Idempotent: re-subscribing the same connection ID replaces the entry.
    pub async fn subscribe(&self, connection: Arc<ClientConnection>) {
        let mut sessions = self.sessions.write().await;
        let members = sessions.entry(connection.session_id.clone()).or_default();
        let _ = members.insert(connection.id.clone(), connection);
    }

    /// Remove a connection from a session.
    ///
    /// A no-op (not an error) if the session or connection is unknown.
    /// Empty sessions are pruned.
    pub async fn unsubscribe(&self, session_id: &str, connection_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(members) = sessions.get_mut(session_id) {
            if members.remove(connection_id).is_some() {
                debug!(session_id, connection_id, "unsubscribed");
            }
            if members.is_empty() {
                let _ = sessions.remove(session_id);
            }
        }
    }

    /// Point-in-time copy of a session's members, for fan-out.
    pub async fn snapshot(&self, session_id: &str) -> Vec<Arc<ClientConnection>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of sessions with at least one live connection.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Total live connections across all sessions.
    pub async fn connection_count(&self) -> usize {
        self.sessions.read().await.values().map(HashMap::len).sum()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
