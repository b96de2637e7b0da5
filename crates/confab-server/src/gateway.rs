//! WebSocket gateway — owns one connection's lifecycle from upgrade through
//! disconnect.
//!
//! Per connection: validate the `sessionID` query parameter (reject with 400
//! before upgrade if missing), subscribe to the registry, then loop reading
//! frames. Each well-formed message is persisted first and only then handed
//! to the dispatcher; a failed append is logged and dropped (best effort,
//! deliberately — there is no error frame in the protocol). A malformed
//! frame or stream error ends the connection: unsubscribe and release the
//! socket, nothing more.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use confab_core::NewChatMessage;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::connection::ClientConnection;
use crate::metrics as metric_names;
use crate::server::AppState;

/// Query parameters for the WebSocket route.
#[derive(Deserialize)]
pub struct WsQuery {
    /// Session to subscribe to. Required and non-empty.
    #[serde(rename = "sessionID")]
    pub session_id: Option<String>,
}

/// `GET /v1/chat/session/ws?sessionID=<id>` — upgrade to a WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let Some(session_id) = query.session_id.filter(|s| !s.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "sessionID is required"})),
        )
            .into_response();
    };
    ws.on_upgrade(move |socket| run_connection(socket, session_id, state))
}

/// Run a connected client until its stream ends or it is closed.
#[instrument(skip_all, fields(session_id = %session_id))]
pub async fn run_connection(socket: WebSocket, session_id: String, state: AppState) {
    let conn_id = format!("conn_{}", Uuid::now_v7());
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(state.settings.send_queue_size);
    let connection = Arc::new(ClientConnection::new(
        conn_id.clone(),
        session_id.clone(),
        send_tx,
    ));

    info!(conn_id, "client connected");
    counter!(metric_names::WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(metric_names::WS_CONNECTIONS_ACTIVE).increment(1.0);

    state.registry.subscribe(connection.clone()).await;

    // Writer task: forwards queued frames, sends periodic pings, and turns
    // the close signal into a Close frame.
    let writer_conn = connection.clone();
    let ping_interval = Duration::from_secs(state.settings.heartbeat_interval_secs.max(1));
    let pong_timeout = Duration::from_secs(state.settings.heartbeat_timeout_secs);
    let writer = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ping.tick().await;
        let mut missed_pongs: u32 = 0;
        #[allow(clippy::cast_possible_truncation)]
        let max_missed = (pong_timeout.as_secs() / ping_interval.as_secs()).max(1) as u32;

        loop {
            tokio::select! {
                () = writer_conn.closed() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
                frame = send_rx.recv() => match frame {
                    Some(text) => {
                        if ws_tx.send(Message::Text((*text).clone().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = ping.tick() => {
                    if writer_conn.check_alive() {
                        missed_pongs = 0;
                    } else {
                        missed_pongs += 1;
                        if missed_pongs >= max_missed {
                            warn!("client unresponsive, disconnecting");
                            break;
                        }
                    }
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read loop. Any exit path below means the connection is done.
    loop {
        let frame = tokio::select! {
            () = connection.closed() => break,
            next = ws_rx.next() => match next {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    info!(conn_id, error = %e, "read error");
                    break;
                }
                None => break,
            },
        };

        let text = match frame {
            Message::Text(ref t) => t.to_string(),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => s.to_string(),
                Err(_) => {
                    info!(conn_id, len = data.len(), "non-UTF8 binary frame, closing");
                    break;
                }
            },
            Message::Close(_) => {
                info!(conn_id, "client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                continue;
            }
        };
        connection.mark_alive();

        let new_message: NewChatMessage = match serde_json::from_str(&text) {
            Ok(message) => message,
            Err(e) => {
                info!(conn_id, error = %e, "malformed frame, closing");
                break;
            }
        };

        // Persist before broadcast. A failed append drops the message —
        // the loop continues and no error frame goes back.
        let message = match state.store.append_message(new_message).await {
            Ok(message) => {
                counter!(metric_names::MESSAGES_PERSISTED_TOTAL).increment(1);
                message
            }
            Err(e) => {
                counter!(metric_names::MESSAGES_DROPPED_TOTAL).increment(1);
                warn!(conn_id, error = %e, "failed to persist message, dropping");
                continue;
            }
        };
        debug!(conn_id, message_id = %message.id, "message accepted");

        if !state.dispatcher.submit(message).await {
            warn!(conn_id, "dispatcher is gone, closing connection");
            break;
        }
    }

    info!(conn_id, age_secs = connection.age().as_secs(), "client disconnected");
    counter!(metric_names::WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(metric_names::WS_CONNECTIONS_ACTIVE).decrement(1.0);
    state.registry.unsubscribe(&session_id, &conn_id).await;
    connection.close();
    writer.abort();
}
