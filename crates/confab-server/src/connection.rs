//! Per-client connection handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Routing handle for one connected WebSocket client.
///
/// The gateway task owns the socket and this handle's lifecycle; the
/// session registry holds a non-owning `Arc` reference for fan-out only.
/// Anything else (the dispatcher, during broadcast) may `send` frames and
/// `close` the connection, but teardown — unsubscribing and releasing the
/// socket — always happens in the owning gateway task.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: String,
    /// Session this connection subscribed to at upgrade time.
    pub session_id: String,
    /// Queue to the connection's writer task.
    tx: mpsc::Sender<Arc<String>>,
    /// Close signal: trips the gateway's writer and read loops.
    cancel: CancellationToken,
    /// When this connection was established.
    connected_at: Instant,
    /// Whether the client has responded since the last ping.
    is_alive: AtomicBool,
    /// Frames dropped due to a full or closed queue.
    dropped_frames: AtomicU64,
}

impl ClientConnection {
    /// Create a new handle.
    pub fn new(id: String, session_id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            session_id,
            tx,
            cancel: CancellationToken::new(),
            connected_at: Instant::now(),
            is_alive: AtomicBool::new(true),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// Enqueue a text frame for delivery.
    ///
    /// Non-blocking. Returns `false` if the queue is full or the writer is
    /// gone — the caller treats that as a delivery failure for this member.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Signal the owning gateway task to tear the connection down.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.cancel.cancelled().await;
    }

    /// Whether the close signal has been tripped.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Mark the connection alive (pong or any client frame received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
    }

    /// Check and reset the alive flag for the heartbeat.
    ///
    /// Returns `true` if the client showed life since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection() -> (ClientConnection, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(8);
        let conn = ClientConnection::new("conn_1".into(), "s1".into(), tx);
        (conn, rx)
    }

    #[tokio::test]
    async fn send_delivers_frame() {
        let (conn, mut rx) = make_connection();
        assert!(conn.send(Arc::new("hello".into())));
        let frame = rx.recv().await.unwrap();
        assert_eq!(&**frame, "hello");
    }

    #[tokio::test]
    async fn send_to_closed_queue_fails() {
        let (tx, rx) = mpsc::channel(8);
        let conn = ClientConnection::new("conn_2".into(), "s1".into(), tx);
        drop(rx);
        assert!(!conn.send(Arc::new("hello".into())));
        assert_eq!(conn.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_to_full_queue_fails() {
        let (tx, _rx) = mpsc::channel(1);
        let conn = ClientConnection::new("conn_3".into(), "s1".into(), tx);
        assert!(conn.send(Arc::new("one".into())));
        assert!(!conn.send(Arc::new("two".into())));
        assert_eq!(conn.drop_count(), 1);
    }

    #[tokio::test]
    async fn close_resolves_closed_future() {
        let (conn, _rx) = make_connection();
        let conn = Arc::new(conn);
        assert!(!conn.is_closed());

        let waiter = conn.clone();
        let handle = tokio::spawn(async move {
            waiter.closed().await;
            true
        });
        conn.close();
        assert!(handle.await.unwrap());
        assert!(conn.is_closed());
    }

    #[test]
    fn close_is_idempotent() {
        let (conn, _rx) = make_connection();
        conn.close();
        conn.close();
        assert!(conn.is_closed());
    }

    #[test]
    fn alive_flag_resets_on_check() {
        let (conn, _rx) = make_connection();
        assert!(conn.check_alive());
        assert!(!conn.check_alive());
        conn.mark_alive();
        assert!(conn.check_alive());
    }

    #[test]
    fn identity_fields() {
        let (conn, _rx) = make_connection();
        assert_eq!(conn.id, "conn_1");
        assert_eq!(conn.session_id, "s1");
        assert!(conn.age() < Duration::from_secs(1));
    }
}
