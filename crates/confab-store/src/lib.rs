//! # confab-store
//!
//! `SQLite` persistence for the Confab chat backend.
//!
//! - **Connection pool**: `r2d2`/`rusqlite` with WAL mode and per-connection pragmas
//! - **Migrations**: version-tracked SQL embedded at compile time
//! - **Repositories**: stateless `MessageRepo`/`SessionRepo` taking `&Connection`
//! - **Facade**: [`SqliteChatStore`] implementing the [`ChatStore`] trait that the
//!   server's gateway and dispatcher are written against
//!
//! Writes are best-effort synchronous: the caller appends before broadcasting,
//! and a failed append is logged and dropped upstream, never retried here.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repositories;
pub mod store;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
pub use errors::{Result, StoreError};
pub use migrations::run_migrations;
pub use store::{ChatStore, SqliteChatStore};
