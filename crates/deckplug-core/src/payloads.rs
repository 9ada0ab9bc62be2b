//! Payload shapes for the events the host exchanges.
//!
//! Inbound payloads that embed per-instance settings are generic over the
//! plugin's own settings type `S`. Every field defaults when absent so a
//! sparse payload from the host still decodes.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::event::DeviceInfo;

// ─────────────────────────────────────────────────────────────────────────────
// Shared pieces
// ─────────────────────────────────────────────────────────────────────────────

/// Which renderings a title or image change applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Target {
    /// Hardware and software (the default).
    #[default]
    HardwareAndSoftware,
    /// Only the physical device.
    Hardware,
    /// Only the on-screen rendering.
    Software,
}

impl Target {
    /// Wire value.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::HardwareAndSoftware => 0,
            Self::Hardware => 1,
            Self::Software => 2,
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Self::HardwareAndSoftware),
            1 => Ok(Self::Hardware),
            2 => Ok(Self::Software),
            other => Err(de::Error::custom(format!("unknown target {other}"))),
        }
    }
}

/// Position of an action instance on the device grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    /// Zero-based column.
    pub column: u32,
    /// Zero-based row.
    pub row: u32,
}

/// Title rendering options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TitleParameters {
    /// Font family name.
    pub font_family: String,
    /// Font size in points.
    pub font_size: u32,
    /// Font style (`Regular`, `Bold`, ...).
    pub font_style: String,
    /// Underlined.
    pub font_underline: bool,
    /// Whether the title is shown at all.
    pub show_title: bool,
    /// `top`, `middle` or `bottom`.
    pub title_alignment: String,
    /// Hex color.
    pub title_color: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────────────────────────

/// `keyDown` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct KeyDownPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Current state index.
    pub state: u32,
    /// State the user asked for in a multi-action.
    pub user_desired_state: u32,
    /// Whether the instance is part of a multi-action.
    pub is_in_multi_action: bool,
}

/// `keyUp` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct KeyUpPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Current state index.
    pub state: u32,
    /// State the user asked for in a multi-action.
    pub user_desired_state: u32,
    /// Whether the instance is part of a multi-action.
    pub is_in_multi_action: bool,
}

/// `willAppear` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct WillAppearPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Current state index.
    pub state: u32,
    /// Whether the instance is part of a multi-action.
    pub is_in_multi_action: bool,
}

/// `willDisappear` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct WillDisappearPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Current state index.
    pub state: u32,
    /// Whether the instance is part of a multi-action.
    pub is_in_multi_action: bool,
}

/// `touchTap` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct TouchTapPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Tap position on the touch strip segment.
    pub tap_pos: [i32; 2],
    /// Long press.
    pub hold: bool,
}

/// `dialDown` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct DialDownPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Controller kind, always `Encoder`.
    pub controller: String,
}

/// `dialUp` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct DialUpPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Controller kind, always `Encoder`.
    pub controller: String,
}

/// `dialRotate` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct DialRotatePayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Signed rotation steps.
    pub ticks: i32,
    /// Whether the dial was held while rotating.
    pub pressed: bool,
}

/// `didReceiveSettings` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct DidReceiveSettingsPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Whether the instance is part of a multi-action.
    pub is_in_multi_action: bool,
}

/// `didReceiveGlobalSettings` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct DidReceiveGlobalSettingsPayload<S> {
    /// Plugin-wide settings.
    pub settings: S,
}

/// `titleParametersDidChange` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct TitleParametersDidChangePayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Current state index.
    pub state: u32,
    /// New title.
    pub title: String,
    /// New rendering options.
    pub title_parameters: TitleParameters,
}

/// `propertyInspectorDidAppear` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct PropertyInspectorDidAppearPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Current state index.
    pub state: u32,
    /// Whether the instance is part of a multi-action.
    pub is_in_multi_action: bool,
}

/// `propertyInspectorDidDisappear` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, bound(deserialize = "S: DeserializeOwned + Default"))]
pub struct PropertyInspectorDidDisappearPayload<S> {
    /// Instance settings.
    pub settings: S,
    /// Grid position.
    pub coordinates: Coordinates,
    /// Current state index.
    pub state: u32,
    /// Whether the instance is part of a multi-action.
    pub is_in_multi_action: bool,
}

/// `didReceivePropertyInspectorMessage` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "M: DeserializeOwned + Default"))]
pub struct DidReceivePropertyInspectorMessagePayload<M> {
    /// Action identity of the sending inspector.
    pub action: String,
    /// Message body.
    pub message: M,
}

/// `applicationDidLaunch` / `applicationDidTerminate` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationPayload {
    /// Bundle id or executable name.
    pub application: String,
}

/// `didReceiveDeepLink` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DidReceiveDeepLinkPayload {
    /// Full deep-link URL.
    pub url: String,
}

/// `deviceDidConnect` / `deviceDidDisconnect` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceDidChangePayload {
    /// Device that changed.
    pub device_info: DeviceInfo,
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────────────────────────

/// `logMessage` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogMessagePayload {
    /// Line to log.
    pub message: String,
}

/// `openUrl` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenUrlPayload {
    /// URL to open.
    pub url: String,
}

/// `setTitle` payload. An empty title resets to the user's title.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetTitlePayload {
    /// Title text.
    pub title: String,
    /// Renderings to update.
    pub target: Target,
    /// State to update; all states when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<u32>,
}

/// `setImage` payload. An empty image resets to the manifest image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetImagePayload {
    /// Data URL or SVG.
    pub image: String,
    /// Renderings to update.
    pub target: Target,
    /// State to update; all states when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<u32>,
}

/// `setState` payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetStatePayload {
    /// Zero-based state index.
    pub state: u32,
}

/// `switchToProfile` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchProfilePayload {
    /// Profile name as declared in the manifest.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub profile: String,
    /// Page to open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// `setFeedbackLayout` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetFeedbackLayoutPayload {
    /// Built-in layout id or path to a layout file.
    pub layout: String,
}

/// `setTriggerDescription` payload. Absent entries revert to the manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetTriggerDescriptionPayload {
    /// Long touch description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_touch: Option<String>,
    /// Push description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<String>,
    /// Rotate description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<String>,
    /// Touch description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Settings {
        #[serde(default)]
        counter: i64,
    }

    #[test]
    fn target_wire_values() {
        assert_eq!(serde_json::to_value(Target::HardwareAndSoftware).unwrap(), json!(0));
        assert_eq!(serde_json::to_value(Target::Hardware).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(Target::Software).unwrap(), json!(2));
        assert_eq!(serde_json::from_value::<Target>(json!(2)).unwrap(), Target::Software);
    }

    #[test]
    fn unknown_target_rejected() {
        assert!(serde_json::from_value::<Target>(json!(7)).is_err());
    }

    #[test]
    fn sparse_key_down_uses_defaults() {
        let payload: KeyDownPayload<Settings> = serde_json::from_value(json!({})).unwrap();
        assert_eq!(payload, KeyDownPayload::default());
    }

    #[test]
    fn will_appear_with_settings() {
        let payload: WillAppearPayload<Settings> = serde_json::from_value(json!({
            "settings": {"counter": 2},
            "coordinates": {"column": 1, "row": 0},
            "isInMultiAction": true
        }))
        .unwrap();
        assert_eq!(payload.settings.counter, 2);
        assert_eq!(payload.coordinates, Coordinates { column: 1, row: 0 });
        assert!(payload.is_in_multi_action);
    }

    #[test]
    fn title_parameters_decode() {
        let payload: TitleParametersDidChangePayload<Value> = serde_json::from_value(json!({
            "title": "Hi",
            "titleParameters": {"fontSize": 12, "showTitle": true, "titleAlignment": "top"}
        }))
        .unwrap();
        assert_eq!(payload.title, "Hi");
        assert_eq!(payload.title_parameters.font_size, 12);
        assert!(payload.title_parameters.show_title);
    }

    #[test]
    fn set_title_omits_absent_state() {
        let wire = serde_json::to_value(SetTitlePayload {
            title: "T".into(),
            target: Target::Hardware,
            state: None,
        })
        .unwrap();
        assert_eq!(wire, json!({"title": "T", "target": 1}));
    }

    #[test]
    fn switch_profile_omits_empty_fields() {
        let wire = serde_json::to_value(SwitchProfilePayload::default()).unwrap();
        assert_eq!(wire, json!({}));
    }

    #[test]
    fn trigger_description_camel_case() {
        let wire = serde_json::to_value(SetTriggerDescriptionPayload {
            long_touch: Some("reset".into()),
            ..SetTriggerDescriptionPayload::default()
        })
        .unwrap();
        assert_eq!(wire, json!({"longTouch": "reset"}));
    }

    #[test]
    fn device_did_change_decode() {
        let payload: DeviceDidChangePayload = serde_json::from_value(json!({
            "deviceInfo": {"name": "Desk", "type": 0, "size": {"columns": 5, "rows": 3}}
        }))
        .unwrap();
        assert_eq!(payload.device_info.device_name, "Desk");
        assert_eq!(payload.device_info.size.columns, 5);
    }
}
