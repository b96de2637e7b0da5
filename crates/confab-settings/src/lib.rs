//! # confab-settings
//!
//! Configuration for the Confab server, loaded from three layers in
//! priority order:
//!
//! 1. **Compiled defaults** — [`ConfabSettings::default()`]
//! 2. **User file** — `~/.confab/settings.json`, deep-merged over defaults
//! 3. **Environment variables** — `CONFAB_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ConfabSettings, DatabaseSettings, ReplySettings, ServerSettings};
