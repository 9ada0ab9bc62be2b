//! # deckplug-settings
//!
//! Launch parameters and runtime settings for a plugin process.
//!
//! - **Registration**: [`RegistrationParams`] parsed from the host's
//!   `-port -pluginUUID -registerEvent -info` arguments
//! - **Runtime settings**: [`RuntimeSettings`] loaded in three layers (in
//!   priority order):
//!   1. **Compiled defaults**: [`RuntimeSettings::default()`]
//!   2. **Settings file**: `$DECKPLUG_SETTINGS` or `./deckplug.json`
//!      (deep-merged over defaults)
//!   3. **Environment variables**: `DECKPLUG_*` overrides

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod registration;
pub mod types;

pub use errors::{RegistrationError, Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_env_overrides_from, deep_merge, load_settings,
    load_settings_from_path, settings_path,
};
pub use registration::{
    ApplicationInfo, PluginInfo, RegisteredDevice, RegistrationInfo, RegistrationParams,
};
pub use types::RuntimeSettings;
