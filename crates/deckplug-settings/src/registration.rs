//! Registration parameters passed by the host on the command line.
//!
//! The host launches a plugin as
//! `plugin -port 28196 -pluginUUID <uuid> -registerEvent registerPlugin -info <json>`.
//! Flags use a single dash, may appear in any order, and `-flag=value` is
//! accepted as well. Unknown flags are ignored.

use std::collections::BTreeMap;

use deckplug_core::{DeviceSize, DeviceType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::RegistrationError;

/// Host application details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationInfo {
    /// UI font.
    pub font: String,
    /// UI language code.
    pub language: String,
    /// `mac` or `windows`.
    pub platform: String,
    /// OS version.
    pub platform_version: String,
    /// Host application version.
    pub version: String,
}

/// Identity of the plugin as the host sees it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginInfo {
    /// Plugin uuid from the manifest.
    pub uuid: String,
    /// Plugin version from the manifest.
    pub version: String,
}

/// A device attached at launch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisteredDevice {
    /// Device id used in envelopes.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Key grid size.
    pub size: DeviceSize,
    /// Hardware model.
    #[serde(rename = "type")]
    pub device_type: DeviceType,
}

/// Decoded `-info` argument.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationInfo {
    /// Host application.
    pub application: ApplicationInfo,
    /// This plugin.
    pub plugin: PluginInfo,
    /// Display scale factor.
    pub device_pixel_ratio: f64,
    /// Theme colors keyed by role.
    pub colors: BTreeMap<String, String>,
    /// Devices attached at launch.
    pub devices: Vec<RegisteredDevice>,
}

/// Everything needed to open and register a session.
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationParams {
    /// Loopback port the host listens on.
    pub port: u16,
    /// Session uuid to register with.
    pub plugin_uuid: String,
    /// Registration event name.
    pub register_event: String,
    /// Decoded `-info`.
    pub info: RegistrationInfo,
    /// `-info` as received.
    pub raw_info: String,
}

impl RegistrationParams {
    /// Build parameters directly, with empty registration info.
    pub fn new(port: u16, plugin_uuid: impl Into<String>, register_event: impl Into<String>) -> Self {
        Self {
            port,
            plugin_uuid: plugin_uuid.into(),
            register_event: register_event.into(),
            info: RegistrationInfo::default(),
            raw_info: String::new(),
        }
    }

    /// Parse the current process arguments.
    pub fn from_env() -> Result<Self, RegistrationError> {
        Self::from_args(std::env::args().skip(1))
    }

    /// Parse launch arguments, excluding the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut port = None;
        let mut plugin_uuid = None;
        let mut register_event = None;
        let mut raw_info = None;

        let mut args = args.into_iter().map(Into::into).peekable();
        while let Some(arg) = args.next() {
            let Some(flag) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
                debug!(arg = %arg, "ignoring positional argument");
                continue;
            };
            let (name, inline) = match flag.split_once('=') {
                Some((name, value)) => (name.to_owned(), Some(value.to_owned())),
                None => (flag.to_owned(), None),
            };

            let slot = match name.as_str() {
                "port" => &mut port,
                "pluginUUID" => &mut plugin_uuid,
                "registerEvent" => &mut register_event,
                "info" => &mut raw_info,
                _ => {
                    debug!(flag = %name, "ignoring unknown flag");
                    if inline.is_none() && args.peek().is_some_and(|next| !next.starts_with('-')) {
                        let _ = args.next();
                    }
                    continue;
                }
            };
            *slot = inline.or_else(|| args.next());
        }

        let port = port.ok_or(RegistrationError::MissingPort)?;
        let port = port
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or(RegistrationError::InvalidPort { value: port })?;
        let plugin_uuid = plugin_uuid
            .filter(|v| !v.is_empty())
            .ok_or(RegistrationError::MissingPluginUuid)?;
        let register_event = register_event
            .filter(|v| !v.is_empty())
            .ok_or(RegistrationError::MissingRegisterEvent)?;
        let raw_info = raw_info.ok_or(RegistrationError::MissingInfo)?;
        let info = serde_json::from_str(&raw_info).map_err(RegistrationError::InvalidInfo)?;

        Ok(Self {
            port,
            plugin_uuid,
            register_event,
            info,
            raw_info,
        })
    }
}
