//! # confab-llm
//!
//! Reply generation for the Confab chat backend.
//!
//! The dispatcher only knows the [`ReplyGenerator`] trait: prompt text in,
//! reply text out, may take seconds, may fail. The deadline lives here (the
//! HTTP client's request timeout), not in the dispatcher — a hung upstream
//! surfaces as a timeout error, and the dispatcher logs it and moves on.
//!
//! - [`OpenAiReplyGenerator`]: OpenAI-compatible `/chat/completions` client
//! - [`MockReplyGenerator`]: scripted responses for tests

#![deny(unsafe_code)]

pub mod mock;
pub mod openai;

pub use mock::{MockReplyGenerator, ScriptedReply};
pub use openai::{OpenAiConfig, OpenAiReplyGenerator};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from reply generation.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// Transport-level failure (connect, timeout, TLS, decode).
    #[error("reply request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream returned a non-success status.
    #[error("reply API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Upstream error body (truncated).
        message: String,
    },

    /// The upstream answered 2xx but carried no usable reply text.
    #[error("reply response contained no content")]
    MissingContent,

    /// Scripted failure from the mock.
    #[error("{0}")]
    Scripted(String),
}

/// Turns prompt text into reply text.
///
/// Implementations may block for seconds; callers must treat failure as
/// non-fatal (log and skip the reply, never crash the dispatcher).
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate a reply for the given prompt.
    async fn generate_reply(&self, prompt: &str) -> Result<String, ReplyError>;
}
