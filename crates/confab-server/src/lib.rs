//! # confab-server
//!
//! Axum HTTP + `WebSocket` server and real-time session fan-out for Confab.
//!
//! The real-time core is three pieces:
//!
//! - [`registry::SessionRegistry`] — which live connections belong to which
//!   session (the only shared mutable state, behind one lock)
//! - [`gateway`] — one task per connection: validate, subscribe, read,
//!   persist, hand off; unsubscribe on any exit
//! - [`dispatcher::Dispatcher`] — the single sequencer: fan out each inbound
//!   message, drive the reply generator for user messages, fan out the
//!   assistant reply and the `{"status":"finished"}` marker
//!
//! Plus the HTTP surface: health, Prometheus metrics, and the REST routes
//! for message history and session CRUD.

#![deny(unsafe_code)]

pub mod connection;
pub mod dispatcher;
pub mod gateway;
pub mod health;
pub mod metrics;
pub mod registry;
pub mod routes;
pub mod server;

pub use connection::ClientConnection;
pub use dispatcher::{Dispatcher, DispatcherHandle};
pub use registry::SessionRegistry;
pub use server::{AppState, ConfabServer};
