//! Settings loading: defaults, file deep-merge, env overrides.
//!
//! Deep merge rules:
//! - Objects merge recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ConfabSettings;

/// Resolve the default settings file path (`~/.confab/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".confab").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ConfabSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; an unreadable or invalid file is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ConfabSettings> {
    let defaults = serde_json::to_value(ConfabSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ConfabSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `CONFAB_*` environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut ConfabSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary lookup (testable without touching the
/// process environment).
///
/// Parsing is strict: out-of-range or unparseable values are silently
/// ignored, falling back to the file/default value.
#[allow(clippy::cast_possible_truncation)]
pub fn apply_overrides_from(
    settings: &mut ConfabSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = read_string(&lookup, "CONFAB_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_u64(&lookup, "CONFAB_PORT", 0, 65_535) {
        settings.server.port = v as u16;
    }
    if let Some(v) = read_u64(&lookup, "CONFAB_SEND_QUEUE", 1, 1_000_000) {
        settings.server.send_queue_size = v as usize;
    }
    if let Some(v) = read_u64(&lookup, "CONFAB_DISPATCH_QUEUE", 1, 1_000_000) {
        settings.server.dispatch_queue_size = v as usize;
    }
    if let Some(v) = read_u64(&lookup, "CONFAB_HEARTBEAT_INTERVAL_SECS", 1, 3_600) {
        settings.server.heartbeat_interval_secs = v;
    }
    if let Some(v) = read_u64(&lookup, "CONFAB_HEARTBEAT_TIMEOUT_SECS", 1, 3_600) {
        settings.server.heartbeat_timeout_secs = v;
    }
    if let Some(v) = read_string(&lookup, "CONFAB_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = read_string(&lookup, "CONFAB_REPLY_BASE_URL") {
        settings.reply.base_url = v;
    }
    if let Some(v) = read_string(&lookup, "CONFAB_REPLY_MODEL") {
        settings.reply.model = v;
    }
    if let Some(v) = read_string(&lookup, "CONFAB_REPLY_API_KEY") {
        settings.reply.api_key = v;
    }
    if let Some(v) = read_u64(&lookup, "CONFAB_REPLY_TIMEOUT_SECS", 1, 3_600) {
        settings.reply.timeout_secs = v;
    }
}

fn read_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.is_empty())
}

fn read_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: u64,
    max: u64,
) -> Option<u64> {
    lookup(name)?
        .parse::<u64>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}
