//! Settings schema.

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfabSettings {
    /// HTTP/WebSocket server settings.
    pub server: ServerSettings,
    /// Database settings.
    pub database: DatabaseSettings,
    /// Reply generator settings.
    pub reply: ReplySettings,
}

/// Server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
    /// Per-connection outbound queue capacity (frames).
    pub send_queue_size: usize,
    /// Dispatcher inbound queue capacity (messages). Producers (connection
    /// read loops) wait when it is full — the explicit backpressure knob.
    pub dispatch_queue_size: usize,
    /// Seconds between server-initiated pings.
    pub heartbeat_interval_secs: u64,
    /// Seconds without a pong before a client is considered dead.
    pub heartbeat_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            send_queue_size: 256,
            dispatch_queue_size: 1024,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
        }
    }
}

/// Database settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `SQLite` database path.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "confab.db".into(),
        }
    }
}

/// Reply generator settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplySettings {
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    /// Model ID.
    pub model: String,
    /// API key. Empty means "read from `OPENAI_API_KEY`".
    pub api_key: String,
    /// Per-request deadline in seconds. The dispatcher has no deadline of
    /// its own; this is the only bound on a hung generation call.
    pub timeout_secs: u64,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = ConfabSettings::default();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.send_queue_size, 256);
        assert_eq!(settings.server.dispatch_queue_size, 1024);
        assert_eq!(settings.database.path, "confab.db");
        assert_eq!(settings.reply.model, "gpt-4o");
        assert_eq!(settings.reply.timeout_secs, 60);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: ConfabSettings =
            serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.reply.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn roundtrip() {
        let settings = ConfabSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: ConfabSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.port, settings.server.port);
        assert_eq!(back.reply.timeout_secs, settings.reply.timeout_secs);
    }
}
