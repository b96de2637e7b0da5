//! Settings error types.

use thiserror::Error;

/// Errors while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Could not read the settings file.
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON, or does not match the schema.
    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias for settings results.
pub type Result<T> = std::result::Result<T, SettingsError>;
