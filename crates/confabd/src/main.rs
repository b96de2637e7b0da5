//! # confabd
//!
//! Confab server binary — wires the store, registry, dispatcher, and reply
//! generator together and serves HTTP + WebSocket until ctrl-c.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use confab_llm::{OpenAiConfig, OpenAiReplyGenerator, ReplyGenerator};
use confab_server::{ConfabServer, Dispatcher, SessionRegistry, metrics};
use confab_settings::ConfabSettings;
use confab_store::{ChatStore, ConnectionConfig, SqliteChatStore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Confab chat backend server.
#[derive(Parser, Debug)]
#[command(name = "confabd", about = "Confab chat backend server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` database (overrides settings).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Path to the settings file (default `~/.confab/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Pick the reply API key: settings first, environment second.
fn resolve_api_key(configured: &str, env_value: Option<String>) -> String {
    if configured.is_empty() {
        env_value.unwrap_or_default()
    } else {
        configured.to_string()
    }
}

fn apply_cli_overrides(settings: &mut ConfabSettings, args: &Cli) {
    if let Some(ref host) = args.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(ref db_path) = args.db_path {
        settings.database.path = db_path.to_string_lossy().into_owned();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(confab_settings::settings_path);
    let mut settings = confab_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    apply_cli_overrides(&mut settings, &args);

    // Database
    let db_path = PathBuf::from(&settings.database.path);
    ensure_parent_dir(&db_path)?;
    let pool = confab_store::new_file(&settings.database.path, &ConnectionConfig::default())
        .context("Failed to open database")?;
    {
        let conn = pool.get().context("Failed to get DB connection")?;
        let _ = confab_store::run_migrations(&conn).context("Failed to run migrations")?;
    }
    let store: Arc<dyn ChatStore> = Arc::new(SqliteChatStore::new(pool));

    // Reply generator
    let api_key = resolve_api_key(
        &settings.reply.api_key,
        std::env::var("OPENAI_API_KEY").ok(),
    );
    if api_key.is_empty() {
        warn!(
            "no reply API key configured (reply.api_key or OPENAI_API_KEY) — \
             reply generation will fail until one is set"
        );
    }
    let generator: Arc<dyn ReplyGenerator> = Arc::new(
        OpenAiReplyGenerator::new(OpenAiConfig {
            base_url: settings.reply.base_url.clone(),
            api_key,
            model: settings.reply.model.clone(),
            timeout: Duration::from_secs(settings.reply.timeout_secs),
        })
        .context("Failed to build reply generator")?,
    );

    // Real-time core
    let registry = Arc::new(SessionRegistry::new());
    let (dispatch_handle, dispatcher) = Dispatcher::new(
        registry.clone(),
        store.clone(),
        generator,
        settings.server.dispatch_queue_size,
    );
    let cancel = CancellationToken::new();
    let dispatcher_task = tokio::spawn(dispatcher.run(cancel.clone()));

    // Server
    let metrics_handle = metrics::install_recorder();
    let server = ConfabServer::new(
        settings.server.clone(),
        registry,
        store,
        dispatch_handle,
        Some(metrics_handle),
    );
    let (addr, serve_task) = server.listen().await.context("Failed to bind server")?;
    info!(model = %settings.reply.model, "confabd listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    info!("shutting down");
    server.shutdown();
    cancel.cancel();
    let _ = serve_task.await;
    let _ = dispatcher_task.await;
    info!("shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_no_overrides() {
        let cli = Cli::parse_from(["confabd"]);
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.db_path.is_none());
        assert!(cli.settings.is_none());
    }

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::parse_from([
            "confabd",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--db-path",
            "/tmp/confab.db",
        ]);
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/confab.db")));
    }

    #[test]
    fn cli_overrides_apply_to_settings() {
        let cli = Cli::parse_from(["confabd", "--port", "9000", "--db-path", "x.db"]);
        let mut settings = ConfabSettings::default();
        apply_cli_overrides(&mut settings, &cli);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.database.path, "x.db");
        // Untouched fields keep their defaults.
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn resolve_api_key_prefers_settings() {
        assert_eq!(
            resolve_api_key("sk-settings", Some("sk-env".into())),
            "sk-settings"
        );
    }

    #[test]
    fn resolve_api_key_falls_back_to_env() {
        assert_eq!(resolve_api_key("", Some("sk-env".into())), "sk-env");
        assert_eq!(resolve_api_key("", None), "");
    }

    #[test]
    fn ensure_parent_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("confab.db");
        ensure_parent_dir(&path).unwrap();
        assert!(path.parent().unwrap().exists());
    }

    #[test]
    fn ensure_parent_dir_handles_bare_filename() {
        ensure_parent_dir(Path::new("confab.db")).unwrap();
    }
}
