//! # confab-core
//!
//! Foundation types for the Confab chat backend.
//!
//! This crate provides the shared vocabulary that all other Confab crates
//! depend on:
//!
//! - **Messages**: [`ChatMessage`] with role, content, and opaque metadata
//! - **Roles**: [`ChatRole`] — `user`, `assistant`, `system`
//! - **Sessions**: [`Session`] lifecycle records
//! - **Wire frames**: [`ReplyFinished`] completion marker
//!
//! [`ChatMessage`]: messages::ChatMessage
//! [`ChatRole`]: messages::ChatRole
//! [`Session`]: session::Session
//! [`ReplyFinished`]: messages::ReplyFinished

#![deny(unsafe_code)]

pub mod messages;
pub mod session;

pub use messages::{ChatMessage, ChatRole, NewChatMessage, ReplyFinished};
pub use session::{Session, SessionStatus};
