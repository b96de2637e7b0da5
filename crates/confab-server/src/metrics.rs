//! Prometheus metrics recorder and metric name constants.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

// Metric name constants to avoid typos across modules.

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Broadcast delivery failures total (counter).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// Inbound messages persisted total (counter).
pub const MESSAGES_PERSISTED_TOTAL: &str = "messages_persisted_total";
/// Inbound messages dropped on persistence failure (counter).
pub const MESSAGES_DROPPED_TOTAL: &str = "messages_dropped_total";
/// Assistant replies generated and persisted total (counter).
pub const REPLIES_GENERATED_TOTAL: &str = "replies_generated_total";
/// Reply generation failures total (counter).
pub const REPLY_FAILURES_TOTAL: &str = "reply_failures_total";
/// Reply generation duration in seconds (histogram).
pub const REPLY_DURATION_SECONDS: &str = "reply_duration_seconds";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_renders_without_global_install() {
        // Build a recorder + handle without installing globally, so tests
        // don't conflict over the global recorder slot.
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let output = handle.render();
        assert!(output.is_empty() || output.contains('\n') || output.contains('#'));
    }

    #[test]
    fn metric_names_are_snake_case() {
        let names = [
            WS_CONNECTIONS_TOTAL,
            WS_DISCONNECTIONS_TOTAL,
            WS_CONNECTIONS_ACTIVE,
            WS_BROADCAST_DROPS_TOTAL,
            MESSAGES_PERSISTED_TOTAL,
            MESSAGES_DROPPED_TOTAL,
            REPLIES_GENERATED_TOTAL,
            REPLY_FAILURES_TOTAL,
            REPLY_DURATION_SECONDS,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
