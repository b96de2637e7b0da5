//! `ConfabServer` — Axum HTTP + WebSocket server assembly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use confab_settings::ServerSettings;
use confab_store::ChatStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dispatcher::DispatcherHandle;
use crate::gateway;
use crate::health::{self, HealthResponse};
use crate::registry::SessionRegistry;
use crate::routes;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session membership registry.
    pub registry: Arc<SessionRegistry>,
    /// Message and session persistence.
    pub store: Arc<dyn ChatStore>,
    /// Producer side of the dispatcher channel.
    pub dispatcher: DispatcherHandle,
    /// Server settings (queue sizes, heartbeat cadence).
    pub settings: Arc<ServerSettings>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus render handle, if the recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The assembled Confab server.
pub struct ConfabServer {
    state: AppState,
    shutdown: CancellationToken,
}

impl ConfabServer {
    /// Assemble a server from its injected components.
    pub fn new(
        settings: ServerSettings,
        registry: Arc<SessionRegistry>,
        store: Arc<dyn ChatStore>,
        dispatcher: DispatcherHandle,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            state: AppState {
                registry,
                store,
                dispatcher,
                settings: Arc::new(settings),
                start_time: Instant::now(),
                metrics,
            },
            shutdown: CancellationToken::new(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/v1/chat/session/ws", get(gateway::ws_handler))
            .route("/v1/chat/message/{session_id}", get(routes::list_messages))
            .route("/v1/chat/message", post(routes::create_message))
            .route(
                "/v1/session",
                get(routes::list_sessions).post(routes::create_session),
            )
            .route("/v1/session/{id}", delete(routes::delete_session))
            .with_state(self.state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and start serving. Returns the bound address and the serve task.
    ///
    /// The task exits after [`shutdown`](Self::shutdown) is called (graceful:
    /// in-flight requests drain first).
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = tokio::net::TcpListener::bind((
            self.state.settings.host.as_str(),
            self.state.settings.port,
        ))
        .await?;
        let addr = listener.local_addr()?;

        let router = self.router();
        let token = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "server error");
            }
        });

        info!(%addr, "server listening");
        Ok((addr, handle))
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Shared state (handlers, tests).
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// `GET /health`
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.registry.connection_count().await;
    let sessions = state.registry.session_count().await;
    Json(health::health_check(state.start_time, connections, sessions))
}

/// `GET /metrics` — Prometheus text format.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
