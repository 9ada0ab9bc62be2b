//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RuntimeSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `DECKPLUG_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::RuntimeSettings;

/// Env var naming an explicit settings file.
pub const SETTINGS_PATH_ENV: &str = "DECKPLUG_SETTINGS";

/// Resolve the settings file: `$DECKPLUG_SETTINGS`, else `deckplug.json` next
/// to the working directory the host launched the plugin in.
pub fn settings_path() -> PathBuf {
    std::env::var(SETTINGS_PATH_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from("deckplug.json"), PathBuf::from)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<RuntimeSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<RuntimeSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<RuntimeSettings> {
    let defaults = serde_json::to_value(RuntimeSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

fn validate(settings: &RuntimeSettings) -> Result<()> {
    if settings.close_timeout_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "closeTimeoutMs must be positive".to_string(),
        ));
    }
    if settings.handler_timeout_ms == Some(0) {
        return Err(SettingsError::InvalidValue(
            "handlerTimeoutMs must be positive when set".to_string(),
        ));
    }
    if settings.host.is_empty() {
        return Err(SettingsError::InvalidValue("host must not be empty".to_string()));
    }
    Ok(())
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

/// Apply `DECKPLUG_*` overrides from the process environment.
pub fn apply_env_overrides(settings: &mut RuntimeSettings) {
    apply_env_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply `DECKPLUG_*` overrides read through `lookup`.
///
/// Integers must parse and fall within range; booleans accept
/// `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`. Invalid values are logged
/// and ignored.
pub fn apply_env_overrides_from(
    settings: &mut RuntimeSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = read_string(&lookup, "DECKPLUG_HOST") {
        settings.host = v;
    }
    if let Some(v) = read_u64(&lookup, "DECKPLUG_CLOSE_TIMEOUT_MS", 1, 60_000) {
        settings.close_timeout_ms = v;
    }
    if let Some(v) = read_u64(&lookup, "DECKPLUG_HANDLER_TIMEOUT_MS", 1, 3_600_000) {
        settings.handler_timeout_ms = Some(v);
    }
    if let Some(v) = read_bool(&lookup, "DECKPLUG_REPORT_HANDLER_ERRORS") {
        settings.report_handler_errors = v;
    }
    if let Some(v) = read_string(&lookup, "DECKPLUG_LOG_LEVEL") {
        settings.log_level = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

fn read_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.is_empty())
}

fn read_bool(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    let val = lookup(name)?;
    let result = parse_bool(&val);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: u64,
    max: u64,
) -> Option<u64> {
    let val = lookup(name)?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
