//! REST routes: message history and session CRUD.
//!
//! These sit beside the WebSocket gateway and share its store. The POST
//! message route persists only — it does not broadcast; live delivery is
//! the socket protocol's job.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use confab_core::NewChatMessage;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::server::AppState;

fn internal_error(context: &str, error: &confab_store::StoreError) -> Response {
    warn!(context, error = %error, "store operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": error.to_string()})),
    )
        .into_response()
}

/// `GET /v1/chat/message/{session_id}` — all messages, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Response {
    match state.store.list_messages(session_id).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => internal_error("list_messages", &e),
    }
}

/// `POST /v1/chat/message` — append a message without broadcasting.
pub async fn create_message(
    State(state): State<AppState>,
    Json(new): Json<NewChatMessage>,
) -> Response {
    match state.store.append_message(new).await {
        Ok(message) => Json(message).into_response(),
        Err(e) => internal_error("create_message", &e),
    }
}

/// Body of `POST /v1/session`.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Human-readable session name.
    pub name: String,
}

/// `GET /v1/session` — list all sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Response {
    match state.store.list_sessions().await {
        Ok(sessions) => Json(sessions).into_response(),
        Err(e) => internal_error("list_sessions", &e),
    }
}

/// `POST /v1/session` — create a session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Response {
    match state.store.create_session(&request.name).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => internal_error("create_session", &e),
    }
}

/// `DELETE /v1/session/{id}` — delete a session (no-op if unknown).
pub async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.store.delete_session(id).await {
        Ok(()) => Json(serde_json::json!({"deleted": id})).into_response(),
        Err(e) => internal_error("delete_session", &e),
    }
}
