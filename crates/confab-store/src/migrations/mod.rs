//! Schema migration runner.
//!
//! Migrations are embedded at compile time and applied in version order,
//! each inside its own transaction. The `schema_version` table records what
//! has been applied; re-running the migrator is idempotent.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::{Result, StoreError};

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "chat_messages and sessions tables",
    sql: include_str!("v001_schema.sql"),
}];

/// Run all pending migrations. Returns the number applied.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (\
             version INTEGER PRIMARY KEY,\
             applied_at TEXT NOT NULL\
         )",
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    let mut applied = 0;
    for migration in MIGRATIONS {
        if migration.version <= current {
            debug!(version = migration.version, "migration already applied");
            continue;
        }
        info!(
            version = migration.version,
            description = migration.description,
            "applying migration"
        );
        apply(conn, migration)?;
        applied += 1;
    }
    Ok(applied)
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let wrap = |e: rusqlite::Error| StoreError::Migration {
        message: format!("v{:03}: {e}", migration.version),
    };
    conn.execute_batch("BEGIN").map_err(wrap)?;
    let result = conn.execute_batch(migration.sql).and_then(|()| {
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().to_rfc3339()],
        )
        .map(|_| ())
    });
    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT").map_err(wrap)?;
            Ok(())
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(wrap(e))
        }
    }
}
