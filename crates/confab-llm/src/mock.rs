//! Scripted reply generator for deterministic tests without API calls.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{ReplyError, ReplyGenerator};

/// One pre-programmed response.
#[derive(Clone, Debug)]
pub enum ScriptedReply {
    /// Return this text.
    Reply(String),
    /// Fail with this message.
    Fail(String),
    /// Wait, then resolve the inner response.
    Delay(Duration, Box<ScriptedReply>),
}

impl ScriptedReply {
    /// Convenience: a plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }

    /// Convenience: wrap any response with a delay.
    pub fn delayed(delay: Duration, inner: ScriptedReply) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Mock generator that consumes a script, then falls back to a default.
///
/// Records every prompt it was called with, so tests can assert both the
/// call count and that the dispatcher passed the triggering message's
/// content as the prompt.
pub struct MockReplyGenerator {
    script: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<ScriptedReply>,
    prompts: Mutex<Vec<String>>,
}

impl MockReplyGenerator {
    /// Always answer with the same text.
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(ScriptedReply::text(reply)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fail.
    pub fn failing() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(ScriptedReply::Fail("generator unavailable".into())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer from a script; error once it runs dry.
    pub fn scripted(responses: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// All prompts seen, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    async fn resolve(reply: ScriptedReply) -> Result<String, ReplyError> {
        match reply {
            ScriptedReply::Reply(text) => Ok(text),
            ScriptedReply::Fail(message) => Err(ReplyError::Scripted(message)),
            ScriptedReply::Delay(delay, inner) => {
                tokio::time::sleep(delay).await;
                Box::pin(Self::resolve(*inner)).await
            }
        }
    }
}

#[async_trait]
impl ReplyGenerator for MockReplyGenerator {
    async fn generate_reply(&self, prompt: &str) -> Result<String, ReplyError> {
        self.prompts.lock().push(prompt.to_string());
        let next = self
            .script
            .lock()
            .pop_front()
            .or_else(|| self.fallback.clone());
        match next {
            Some(reply) => Self::resolve(reply).await,
            None => Err(ReplyError::Scripted("script exhausted".into())),
        }
    }
}
