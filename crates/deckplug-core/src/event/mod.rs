//! Event envelope exchanged with the host application.
//!
//! Every frame on the wire is one JSON object of the shape
//! `{"action", "event", "uuid", "context", "device", "deviceInfo", "payload"}`.
//! Empty fields are omitted when encoding. The payload is opaque here; its
//! shape is determined by the event name and decoded on demand with
//! [`Event::decode_payload`] or [`Event::payload_as`].

pub mod names;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::context::EventContext;
use crate::errors::{EnvelopeDecodeError, EnvelopeEncodeError, PayloadDecodeError};

// ─────────────────────────────────────────────────────────────────────────────
// Payload
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque event payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Structured JSON, as decoded from an inbound frame or built in-process.
    Json(Value),
    /// Encoded JSON bytes, validated only when decoded or re-encoded.
    Raw(Vec<u8>),
}

impl Payload {
    /// Wrap raw JSON bytes.
    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Raw(bytes.into())
    }

    /// Decode into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self {
            Self::Json(value) => T::deserialize(value),
            Self::Raw(bytes) => serde_json::from_slice(bytes),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Json(value) => value.serialize(serializer),
            Self::Raw(bytes) => {
                let value: Value =
                    serde_json::from_slice(bytes).map_err(serde::ser::Error::custom)?;
                value.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Json)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Device info
// ─────────────────────────────────────────────────────────────────────────────

/// Hardware model reported by the host. Unknown models keep their raw value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceType(pub u32);

impl DeviceType {
    /// Stream Deck (15 keys).
    pub const STREAM_DECK: Self = Self(0);
    /// Stream Deck Mini.
    pub const STREAM_DECK_MINI: Self = Self(1);
    /// Stream Deck XL.
    pub const STREAM_DECK_XL: Self = Self(2);
    /// Stream Deck Mobile.
    pub const STREAM_DECK_MOBILE: Self = Self(3);
    /// Corsair G-Keys.
    pub const CORSAIR_G_KEYS: Self = Self(4);
    /// Stream Deck Pedal.
    pub const STREAM_DECK_PEDAL: Self = Self(5);
    /// Corsair Voyager.
    pub const CORSAIR_VOYAGER: Self = Self(6);
    /// Stream Deck +.
    pub const STREAM_DECK_PLUS: Self = Self(7);
    /// SCUF controller.
    pub const SCUF_CONTROLLER: Self = Self(8);
    /// Stream Deck Neo.
    pub const STREAM_DECK_NEO: Self = Self(9);
    /// Stream Deck Studio.
    pub const STREAM_DECK_STUDIO: Self = Self(10);

    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Key grid dimensions of a device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSize {
    /// Number of key columns.
    #[serde(default)]
    pub columns: u32,
    /// Number of key rows.
    #[serde(default)]
    pub rows: u32,
}

impl DeviceSize {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Device description attached to device-scoped events.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Display name of the device.
    #[serde(default, alias = "name", skip_serializing_if = "String::is_empty")]
    pub device_name: String,
    /// Hardware model.
    #[serde(rename = "type", default, skip_serializing_if = "DeviceType::is_default")]
    pub device_type: DeviceType,
    /// Key grid size.
    #[serde(default, skip_serializing_if = "DeviceSize::is_empty")]
    pub size: DeviceSize,
}

impl DeviceInfo {
    /// Whether every field is unset.
    pub fn is_empty(&self) -> bool {
        self.device_name.is_empty() && self.device_type.is_default() && self.size.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event
// ─────────────────────────────────────────────────────────────────────────────

/// Wire envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Action identity; empty for host-scoped events.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,
    /// Event name, see [`names`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,
    /// Session uuid (registration and global-settings traffic).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    /// Instance-context id; empty for host-scoped events.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    /// Device id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device: String,
    /// Device description.
    #[serde(default, skip_serializing_if = "DeviceInfo::is_empty")]
    pub device_info: DeviceInfo,
    /// Opaque payload, keyed by `event`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Event {
    /// Build an outbound event without payload, correlated from `ctx`.
    pub fn new(ctx: &EventContext, name: &str) -> Self {
        Self {
            action: ctx.action().to_owned(),
            event: name.to_owned(),
            context: ctx.context().to_owned(),
            device: ctx.device().to_owned(),
            ..Self::default()
        }
    }

    /// Build an outbound event carrying `payload`, correlated from `ctx`.
    pub fn with_payload<T: Serialize + ?Sized>(
        ctx: &EventContext,
        name: &str,
        payload: &T,
    ) -> Result<Self, EnvelopeEncodeError> {
        let value = serde_json::to_value(payload).map_err(|source| EnvelopeEncodeError {
            event_name: name.to_owned(),
            source,
        })?;
        Ok(Self {
            payload: Some(Payload::Json(value)),
            ..Self::new(ctx, name)
        })
    }

    /// The registration frame announcing this session to the host.
    pub fn registration(plugin_uuid: &str, register_event: &str) -> Self {
        Self {
            event: register_event.to_owned(),
            uuid: plugin_uuid.to_owned(),
            ..Self::default()
        }
    }

    /// Decode one text frame.
    pub fn decode(frame: &str) -> Result<Self, EnvelopeDecodeError> {
        serde_json::from_str(frame).map_err(|source| EnvelopeDecodeError { source })
    }

    /// Decode one binary frame.
    pub fn decode_slice(frame: &[u8]) -> Result<Self, EnvelopeDecodeError> {
        serde_json::from_slice(frame).map_err(|source| EnvelopeDecodeError { source })
    }

    /// Encode to the wire form.
    pub fn encode(&self) -> Result<String, EnvelopeEncodeError> {
        serde_json::to_string(self).map_err(|source| EnvelopeEncodeError {
            event_name: self.event.clone(),
            source,
        })
    }

    /// Whether this is a host-scoped event with no action instance.
    pub fn is_no_action(&self) -> bool {
        self.action.is_empty()
    }

    /// Decode the payload into `target`.
    ///
    /// An absent payload leaves `target` untouched and succeeds.
    pub fn decode_payload<T: DeserializeOwned>(
        &self,
        target: &mut T,
    ) -> Result<(), PayloadDecodeError> {
        let Some(payload) = &self.payload else {
            return Ok(());
        };
        *target = payload.decode().map_err(|source| PayloadDecodeError {
            event_name: self.event.clone(),
            source,
        })?;
        Ok(())
    }

    /// Decode the payload as `T`, or `T::default()` if absent.
    pub fn payload_as<T: DeserializeOwned + Default>(&self) -> Result<T, PayloadDecodeError> {
        let mut target = T::default();
        self.decode_payload(&mut target)?;
        Ok(target)
    }

    /// Convert into a [`TypedEvent`] with the payload decoded.
    pub fn to_typed<T: DeserializeOwned + Default>(
        &self,
    ) -> Result<TypedEvent<T>, PayloadDecodeError> {
        Ok(TypedEvent {
            action: self.action.clone(),
            event: self.event.clone(),
            uuid: self.uuid.clone(),
            context: self.context.clone(),
            device: self.device.clone(),
            device_info: self.device_info.clone(),
            payload: self.payload_as()?,
        })
    }
}

/// An [`Event`] whose payload is already decoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypedEvent<T> {
    /// Action identity.
    pub action: String,
    /// Event name.
    pub event: String,
    /// Session uuid.
    pub uuid: String,
    /// Instance-context id.
    pub context: String,
    /// Device id.
    pub device: String,
    /// Device description.
    pub device_info: DeviceInfo,
    /// Decoded payload.
    pub payload: T,
}

impl<T: Serialize> TypedEvent<T> {
    /// Build an outbound typed event correlated from `ctx`.
    pub fn new(ctx: &EventContext, name: &str, payload: T) -> Self {
        Self {
            action: ctx.action().to_owned(),
            event: name.to_owned(),
            uuid: String::new(),
            context: ctx.context().to_owned(),
            device: ctx.device().to_owned(),
            device_info: DeviceInfo::default(),
            payload,
        }
    }

    /// Erase the payload type.
    pub fn into_event(self) -> Result<Event, EnvelopeEncodeError> {
        let value = serde_json::to_value(&self.payload).map_err(|source| EnvelopeEncodeError {
            event_name: self.event.clone(),
            source,
        })?;
        Ok(Event {
            action: self.action,
            event: self.event,
            uuid: self.uuid,
            context: self.context,
            device: self.device,
            device_info: self.device_info,
            payload: Some(Payload::Json(value)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::{KeyDownPayload, LogMessagePayload};
    use assert_matches::assert_matches;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Counter {
        #[serde(default)]
        counter: i64,
    }

    const KEY_DOWN: &str = r#"{"action":"com.example.counter","event":"keyDown","context":"ctx-1","device":"dev-1","payload":{"settings":{"counter":5},"coordinates":{"column":3,"row":1},"state":0,"userDesiredState":1,"isInMultiAction":false}}"#;

    #[test]
    fn decode_inbound_frame() {
        let event = Event::decode(KEY_DOWN).unwrap();
        assert_eq!(event.action, "com.example.counter");
        assert_eq!(event.event, names::KEY_DOWN);
        assert_eq!(event.context, "ctx-1");
        assert_eq!(event.device, "dev-1");
        assert!(event.payload.is_some());
        assert!(!event.is_no_action());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_matches!(Event::decode("not json"), Err(EnvelopeDecodeError { .. }));
        assert_matches!(Event::decode("[1,2,3]"), Err(EnvelopeDecodeError { .. }));
    }

    #[test]
    fn decode_binary_frame() {
        let event = Event::decode_slice(KEY_DOWN.as_bytes()).unwrap();
        assert_eq!(event.event, names::KEY_DOWN);
    }

    #[test]
    fn no_action_event() {
        let event = Event::decode(
            r#"{"event":"applicationDidLaunch","payload":{"application":"com.apple.mail"}}"#,
        )
        .unwrap();
        assert!(event.is_no_action());
        assert!(event.context.is_empty());
    }

    #[test]
    fn round_trip_keeps_correlation_fields() {
        let ctx = EventContext::background().correlate("a.b.c", "ctx-9", "dev-2");
        let event = Event::with_payload(&ctx, names::SET_TITLE, &json!({"title": "x"})).unwrap();
        let back = Event::decode(&event.encode().unwrap()).unwrap();
        assert_eq!(back.action, event.action);
        assert_eq!(back.event, event.event);
        assert_eq!(back.context, event.context);
        assert_eq!(back.device, event.device);
    }

    #[test]
    fn empty_fields_are_omitted() {
        let wire = Event::registration("plugin-uuid", "registerPlugin")
            .encode()
            .unwrap();
        let value: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value, json!({"event": "registerPlugin", "uuid": "plugin-uuid"}));
    }

    #[test]
    fn new_event_reads_context() {
        let ctx = EventContext::background()
            .with_action("act")
            .with_context("ctx")
            .with_device("dev");
        let event = Event::new(&ctx, names::SHOW_OK);
        assert_eq!(event.action, "act");
        assert_eq!(event.context, "ctx");
        assert_eq!(event.device, "dev");
        assert!(event.payload.is_none());
    }

    #[test]
    fn with_payload_stores_value() {
        let payload = LogMessagePayload {
            message: "test".into(),
        };
        let event = Event::with_payload(&EventContext::background(), names::LOG_MESSAGE, &payload)
            .unwrap();
        assert_eq!(event.event, names::LOG_MESSAGE);
        assert_eq!(
            event.payload,
            Some(Payload::Json(json!({"message": "test"})))
        );
    }

    #[test]
    fn decode_payload_valid() {
        let event = Event {
            payload: Some(Payload::raw(r#"{"message": "test"}"#)),
            ..Event::default()
        };
        let mut target = LogMessagePayload::default();
        event.decode_payload(&mut target).unwrap();
        assert_eq!(target.message, "test");
    }

    #[test]
    fn decode_payload_absent_leaves_target() {
        let event = Event::default();
        let mut target = LogMessagePayload {
            message: "keep".into(),
        };
        event.decode_payload(&mut target).unwrap();
        assert_eq!(target.message, "keep");
    }

    #[test]
    fn decode_payload_truncated_is_error() {
        let event = Event {
            event: names::LOG_MESSAGE.into(),
            payload: Some(Payload::raw(r#"{"message": "test""#)),
            ..Event::default()
        };
        let mut target = LogMessagePayload::default();
        let err = event.decode_payload(&mut target).unwrap_err();
        assert_eq!(err.event_name, names::LOG_MESSAGE);
        assert!(target.message.is_empty());
    }

    #[test]
    fn decode_payload_shape_mismatch_is_error() {
        let event = Event {
            event: names::KEY_DOWN.into(),
            payload: Some(Payload::Json(json!({"settings": {"counter": "five"}}))),
            ..Event::default()
        };
        assert_matches!(
            event.payload_as::<KeyDownPayload<Counter>>(),
            Err(PayloadDecodeError { .. })
        );
    }

    #[test]
    fn payload_as_absent_is_default() {
        let event = Event::default();
        let payload: LogMessagePayload = event.payload_as().unwrap();
        assert_eq!(payload, LogMessagePayload::default());
    }

    #[test]
    fn typed_key_down_exposes_counter() {
        let event = Event::decode(KEY_DOWN).unwrap();
        let payload: KeyDownPayload<Counter> = event.payload_as().unwrap();
        assert_eq!(payload.settings.counter, 5);
        assert_eq!(payload.coordinates.column, 3);
        assert_eq!(payload.user_desired_state, 1);
    }

    #[test]
    fn to_typed_copies_fields() {
        let typed = Event::decode(KEY_DOWN)
            .unwrap()
            .to_typed::<KeyDownPayload<Counter>>()
            .unwrap();
        assert_eq!(typed.action, "com.example.counter");
        assert_eq!(typed.context, "ctx-1");
        assert_eq!(typed.payload.settings.counter, 5);
    }

    #[test]
    fn typed_event_into_event() {
        let ctx = EventContext::background().with_context("ctx");
        let event = TypedEvent::new(&ctx, names::LOG_MESSAGE, LogMessagePayload {
            message: "hi".into(),
        })
        .into_event()
        .unwrap();
        assert_eq!(event.context, "ctx");
        assert_eq!(event.payload, Some(Payload::Json(json!({"message": "hi"}))));
    }

    #[test]
    fn raw_payload_encodes_as_json() {
        let event = Event {
            event: names::SEND_TO_PLUGIN.into(),
            payload: Some(Payload::raw(r#"{"a":1}"#)),
            ..Event::default()
        };
        let value: Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(value["payload"], json!({"a": 1}));
    }

    #[test]
    fn invalid_raw_payload_fails_to_encode() {
        let event = Event {
            event: names::SEND_TO_PLUGIN.into(),
            payload: Some(Payload::raw("{")),
            ..Event::default()
        };
        let err = event.encode().unwrap_err();
        assert_eq!(err.event_name, names::SEND_TO_PLUGIN);
    }

    #[test]
    fn null_payload_is_absent() {
        let event = Event::decode(r#"{"event":"systemDidWakeUp","payload":null}"#).unwrap();
        assert!(event.payload.is_none());
    }

    #[test]
    fn device_info_accepts_name_alias() {
        let event = Event::decode(
            r#"{"event":"deviceDidConnect","device":"d","deviceInfo":{"name":"Desk","type":7,"size":{"columns":4,"rows":2}}}"#,
        )
        .unwrap();
        assert_eq!(event.device_info.device_name, "Desk");
        assert_eq!(event.device_info.device_type, DeviceType::STREAM_DECK_PLUS);
        assert_eq!(event.device_info.size, DeviceSize { columns: 4, rows: 2 });
    }

    #[test]
    fn unknown_device_model_still_decodes() {
        let event = Event::decode(
            r#"{"event":"deviceDidConnect","device":"d","deviceInfo":{"deviceName":"Future","type":4096}}"#,
        )
        .unwrap();
        assert_eq!(event.device_info.device_type, DeviceType(4096));
        assert_eq!(event.device, "d");
    }

    #[test]
    fn empty_device_info_is_omitted() {
        let wire = Event::new(&EventContext::background(), names::SHOW_ALERT)
            .encode()
            .unwrap();
        assert!(!wire.contains("deviceInfo"));
    }
}
