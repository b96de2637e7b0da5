//! The dispatcher: single sequencing point for all cross-connection effects.
//!
//! One task consumes one bounded channel. Each message is fully handled —
//! fan-out, reply generation, reply fan-out, completion marker — before the
//! next is dequeued. That serialization is what makes the ordering and
//! no-double-delivery properties hold; the price is that a slow reply
//! generator delays every queued message, which is the documented
//! scalability ceiling of this design.

use std::sync::Arc;

use confab_core::{ChatMessage, ChatRole, NewChatMessage, ReplyFinished};
use confab_llm::ReplyGenerator;
use confab_store::ChatStore;
use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::connection::ClientConnection;
use crate::metrics as metric_names;
use crate::registry::SessionRegistry;

/// Producer side of the dispatcher's inbound channel.
///
/// Held by every gateway task. `submit` waits for queue capacity, so the
/// channel bound is the system's backpressure point.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<ChatMessage>,
}

impl DispatcherHandle {
    /// Enqueue a persisted message for fan-out.
    ///
    /// Returns `false` if the dispatcher has shut down.
    pub async fn submit(&self, message: ChatMessage) -> bool {
        self.tx.send(message).await.is_ok()
    }
}

/// Consumes the inbound channel and performs all broadcasts.
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn ChatStore>,
    generator: Arc<dyn ReplyGenerator>,
    rx: mpsc::Receiver<ChatMessage>,
}

impl Dispatcher {
    /// Create a dispatcher and its submit handle.
    ///
    /// `queue_capacity` bounds the inbound channel; producers wait when it
    /// is full.
    pub fn new(
        registry: Arc<SessionRegistry>,
        store: Arc<dyn ChatStore>,
        generator: Arc<dyn ReplyGenerator>,
        queue_capacity: usize,
    ) -> (DispatcherHandle, Self) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        (
            DispatcherHandle { tx },
            Self {
                registry,
                store,
                generator,
                rx,
            },
        )
    }

    /// Run until cancelled or until every producer handle is dropped.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("dispatcher started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                maybe = self.rx.recv() => match maybe {
                    Some(message) => self.process(message).await,
                    None => break,
                },
            }
        }
        info!("dispatcher stopped");
    }

    /// Handle one inbound message to completion.
    async fn process(&self, message: ChatMessage) {
        let session_key = message.session_id.to_string();

        let Some(frame) = encode(&message) else {
            return;
        };
        let members = self.registry.snapshot(&session_key).await;
        debug!(
            session_id = %session_key,
            role = %message.role,
            recipients = members.len(),
            "broadcasting message"
        );
        for member in &members {
            self.deliver(&session_key, member, &frame).await;
        }

        // Only user messages trigger a reply; replying to assistant or
        // system messages would loop.
        if message.role != ChatRole::User {
            return;
        }
        self.reply(&message, &session_key).await;
    }

    /// Generate, persist, and fan out the assistant reply plus the
    /// completion marker.
    async fn reply(&self, trigger: &ChatMessage, session_key: &str) {
        let started = std::time::Instant::now();
        let reply = match self.generator.generate_reply(&trigger.content).await {
            Ok(reply) => reply,
            Err(e) => {
                // The user's message has already been broadcast; the client
                // sees no reply and no marker. There is no error frame in
                // this protocol.
                counter!(metric_names::REPLY_FAILURES_TOTAL).increment(1);
                warn!(session_id = %session_key, error = %e, "reply generation failed");
                return;
            }
        };
        histogram!(metric_names::REPLY_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        let assistant = match self
            .store
            .append_message(NewChatMessage {
                session_id: trigger.session_id,
                role: ChatRole::Assistant,
                content: reply,
                message_type: trigger.message_type,
                linked_tool_ids: trigger.linked_tool_ids.clone(),
            })
            .await
        {
            Ok(message) => message,
            Err(e) => {
                // Do not announce completion of an unpersisted reply: no
                // assistant frame, no marker.
                warn!(session_id = %session_key, error = %e, "failed to persist assistant reply");
                return;
            }
        };
        counter!(metric_names::REPLIES_GENERATED_TOTAL).increment(1);

        let Some(assistant_frame) = encode(&assistant) else {
            return;
        };
        let finished_frame = match serde_json::to_string(&ReplyFinished::new()) {
            Ok(json) => Arc::new(json),
            Err(e) => {
                error!(error = %e, "failed to serialize completion marker");
                return;
            }
        };

        // Membership may have changed during the generator call; take one
        // fresh snapshot and send both frames, marker strictly second, to
        // that same member set.
        let members = self.registry.snapshot(session_key).await;
        for member in &members {
            if self.deliver(session_key, member, &assistant_frame).await {
                let _ = self.deliver(session_key, member, &finished_frame).await;
            }
        }
    }

    /// Send one frame to one member.
    ///
    /// On failure the member is closed and removed from the registry;
    /// remaining members are unaffected. Returns whether delivery succeeded.
    async fn deliver(
        &self,
        session_key: &str,
        member: &Arc<ClientConnection>,
        frame: &Arc<String>,
    ) -> bool {
        if member.send(Arc::clone(frame)) {
            return true;
        }
        counter!(metric_names::WS_BROADCAST_DROPS_TOTAL).increment(1);
        warn!(
            session_id = %session_key,
            conn_id = %member.id,
            "delivery failed, evicting connection"
        );
        member.close();
        self.registry.unsubscribe(session_key, &member.id).await;
        false
    }
}

fn encode(message: &ChatMessage) -> Option<Arc<String>> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Arc::new(json)),
        Err(e) => {
            error!(message_id = %message.id, error = %e, "failed to serialize message");
            None
        }
    }
}
