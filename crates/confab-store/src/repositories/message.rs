//! Message repository — append-only log of chat messages keyed by session.

use confab_core::{ChatMessage, ChatRole, NewChatMessage};
use rusqlite::{Connection, params};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::errors::{Result, StoreError};

/// Raw column values read back before domain decoding.
struct MessageRow {
    id: String,
    session_id: String,
    role: String,
    content: String,
    created_at: String,
    message_type: i32,
    linked_tool_ids: String,
}

fn parse_role(raw: &str) -> Result<ChatRole> {
    match raw {
        "user" => Ok(ChatRole::User),
        "assistant" => Ok(ChatRole::Assistant),
        "system" => Ok(ChatRole::System),
        other => Err(StoreError::InvalidRow(format!("role '{other}'"))),
    }
}

impl MessageRow {
    fn decode(self) -> Result<ChatMessage> {
        Ok(ChatMessage {
            id: parse_uuid("id", &self.id)?,
            session_id: parse_uuid("session_id", &self.session_id)?,
            role: parse_role(&self.role)?,
            content: self.content,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            message_type: self.message_type,
            linked_tool_ids: serde_json::from_str(&self.linked_tool_ids)?,
        })
    }
}

/// Message repository.
pub struct MessageRepo;

impl MessageRepo {
    /// Append a message, assigning its `id` and `created_at`.
    pub fn append(conn: &Connection, new: &NewChatMessage) -> Result<ChatMessage> {
        let id = Uuid::now_v7();
        let created_at = chrono::Utc::now();
        let _ = conn.execute(
            "INSERT INTO chat_messages \
                 (id, session_id, role, content, created_at, message_type, linked_tool_ids) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                new.session_id.to_string(),
                new.role.as_str(),
                new.content,
                created_at.to_rfc3339(),
                new.message_type,
                serde_json::to_string(&new.linked_tool_ids)?,
            ],
        )?;
        Ok(ChatMessage {
            id,
            session_id: new.session_id,
            role: new.role,
            content: new.content.clone(),
            created_at,
            message_type: new.message_type,
            linked_tool_ids: new.linked_tool_ids.clone(),
        })
    }

    /// List all messages for a session, oldest first.
    pub fn list_for_session(conn: &Connection, session_id: Uuid) -> Result<Vec<ChatMessage>> {
        let mut stmt = conn.prepare(
            "SELECT id, session_id, role, content, created_at, message_type, linked_tool_ids \
             FROM chat_messages \
             WHERE session_id = ?1 \
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([session_id.to_string()], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                session_id: row.get(1)?,
                role: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
                message_type: row.get(5)?,
                linked_tool_ids: row.get(6)?,
            })
        })?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?.decode()?);
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionConfig, new_in_memory};
    use crate::migrations::run_migrations;

    fn conn() -> crate::connection::PooledConnection {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let _ = run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn append_assigns_id_and_timestamp() {
        let conn = conn();
        let new = NewChatMessage::text(Uuid::now_v7(), ChatRole::User, "hello");
        let msg = MessageRepo::append(&conn, &new).unwrap();
        assert!(!msg.id.is_nil());
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn list_returns_ascending_order() {
        let conn = conn();
        let sid = Uuid::now_v7();
        for i in 0..5 {
            let new = NewChatMessage::text(sid, ChatRole::User, format!("m{i}"));
            let _ = MessageRepo::append(&conn, &new).unwrap();
        }
        let messages = MessageRepo::list_for_session(&conn, sid).unwrap();
        assert_eq!(messages.len(), 5);
        for (i, msg) in messages.iter().enumerate() {
            assert_eq!(msg.content, format!("m{i}"));
        }
        for pair in messages.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[test]
    fn list_filters_by_session() {
        let conn = conn();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let _ = MessageRepo::append(&conn, &NewChatMessage::text(a, ChatRole::User, "in a")).unwrap();
        let _ = MessageRepo::append(&conn, &NewChatMessage::text(b, ChatRole::User, "in b")).unwrap();

        let messages = MessageRepo::list_for_session(&conn, a).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "in a");
    }

    #[test]
    fn list_empty_session() {
        let conn = conn();
        let messages = MessageRepo::list_for_session(&conn, Uuid::now_v7()).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn metadata_roundtrips() {
        let conn = conn();
        let sid = Uuid::now_v7();
        let linked = vec![Uuid::now_v7(), Uuid::now_v7()];
        let new = NewChatMessage {
            session_id: sid,
            role: ChatRole::Assistant,
            content: "tagged".into(),
            message_type: 2,
            linked_tool_ids: linked.clone(),
        };
        let _ = MessageRepo::append(&conn, &new).unwrap();

        let messages = MessageRepo::list_for_session(&conn, sid).unwrap();
        assert_eq!(messages[0].message_type, 2);
        assert_eq!(messages[0].linked_tool_ids, linked);
        assert_eq!(messages[0].role, ChatRole::Assistant);
    }

    #[test]
    fn corrupt_timestamp_row_is_invalid() {
        let conn = conn();
        let sid = Uuid::now_v7();
        // Bypass the repo to plant a row the decoder must reject.
        let _ = conn
            .execute(
                "INSERT INTO chat_messages \
                     (id, session_id, role, content, created_at, message_type, linked_tool_ids) \
                 VALUES (?1, ?2, 'user', 'x', 'not-a-date', 0, '[]')",
                params![Uuid::now_v7().to_string(), sid.to_string()],
            )
            .unwrap();
        let err = MessageRepo::list_for_session(&conn, sid).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRow(_)));
    }
}
