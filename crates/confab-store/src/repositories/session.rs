//! Session repository — the durable session shells behind the REST surface.

use confab_core::{Session, SessionStatus};
use rusqlite::{Connection, params};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::errors::{Result, StoreError};

fn parse_status(raw: &str) -> Result<SessionStatus> {
    match raw {
        "active" => Ok(SessionStatus::Active),
        "archived" => Ok(SessionStatus::Archived),
        other => Err(StoreError::InvalidRow(format!("status '{other}'"))),
    }
}

/// Session repository.
pub struct SessionRepo;

impl SessionRepo {
    /// Create a new active session.
    pub fn create(conn: &Connection, name: &str) -> Result<Session> {
        let id = Uuid::now_v7();
        let created_at = chrono::Utc::now();
        let _ = conn.execute(
            "INSERT INTO sessions (id, name, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                name,
                SessionStatus::Active.as_str(),
                created_at.to_rfc3339(),
            ],
        )?;
        Ok(Session {
            id,
            name: name.to_string(),
            status: SessionStatus::Active,
            created_at,
        })
    }

    /// List all sessions, oldest first.
    pub fn list(conn: &Connection) -> Result<Vec<Session>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, status, created_at FROM sessions ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, name, status, created_at) = row?;
            sessions.push(Session {
                id: parse_uuid("id", &id)?,
                name,
                status: parse_status(&status)?,
                created_at: parse_timestamp("created_at", &created_at)?,
            });
        }
        Ok(sessions)
    }

    /// Delete a session. Deleting an unknown id is a no-op.
    pub fn delete(conn: &Connection, id: Uuid) -> Result<()> {
        let _ = conn.execute("DELETE FROM sessions WHERE id = ?1", [id.to_string()])?;
        Ok(())
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
    fn create_returns_active_session() {
        let conn = conn();
        let session = SessionRepo::create(&conn, "triage").unwrap();
        assert_eq!(session.name, "triage");
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[test]
    fn list_returns_created_sessions() {
        let conn = conn();
        let _ = SessionRepo::create(&conn, "one").unwrap();
        let _ = SessionRepo::create(&conn, "two").unwrap();
        let sessions = SessionRepo::list(&conn).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].name, "one");
        assert_eq!(sessions[1].name, "two");
    }

    #[test]
    fn list_empty() {
        let conn = conn();
        assert!(SessionRepo::list(&conn).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_session() {
        let conn = conn();
        let session = SessionRepo::create(&conn, "gone").unwrap();
        SessionRepo::delete(&conn, session.id).unwrap();
        assert!(SessionRepo::list(&conn).unwrap().is_empty());
    }

    #[test]
    fn delete_unknown_is_noop() {
        let conn = conn();
        SessionRepo::delete(&conn, Uuid::now_v7()).unwrap();
    }
}
