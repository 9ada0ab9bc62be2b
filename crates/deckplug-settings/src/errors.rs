//! Settings and registration error types.

use thiserror::Error;

/// Errors that can occur when loading or parsing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was invalid (e.g., out of range).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// The host-supplied launch arguments were missing or malformed.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// `-port` was not supplied.
    #[error("missing -port flag")]
    MissingPort,
    /// `-pluginUUID` was not supplied.
    #[error("missing -pluginUUID flag")]
    MissingPluginUuid,
    /// `-registerEvent` was not supplied.
    #[error("missing -registerEvent flag")]
    MissingRegisterEvent,
    /// `-info` was not supplied.
    #[error("missing -info flag")]
    MissingInfo,
    /// `-port` was not a valid TCP port.
    #[error("invalid -port value: {value:?}")]
    InvalidPort {
        /// The rejected value.
        value: String,
    },
    /// `-info` was not valid registration JSON.
    #[error("invalid -info JSON: {0}")]
    InvalidInfo(#[source] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
