//! Event names used on the wire.

// Inbound: action instance lifecycle
/// An action instance became visible.
pub const WILL_APPEAR: &str = "willAppear";
/// An action instance stopped being visible.
pub const WILL_DISAPPEAR: &str = "willDisappear";
/// The title or its parameters changed.
pub const TITLE_PARAMETERS_DID_CHANGE: &str = "titleParametersDidChange";

// Inbound: input
/// A key was pressed.
pub const KEY_DOWN: &str = "keyDown";
/// A key was released.
pub const KEY_UP: &str = "keyUp";
/// A touch display was tapped.
pub const TOUCH_TAP: &str = "touchTap";
/// A dial was pressed.
pub const DIAL_DOWN: &str = "dialDown";
/// A dial was released.
pub const DIAL_UP: &str = "dialUp";
/// A dial was rotated.
pub const DIAL_ROTATE: &str = "dialRotate";

// Inbound: settings and property inspector
/// Reply to `getSettings`, or settings changed in the property inspector.
pub const DID_RECEIVE_SETTINGS: &str = "didReceiveSettings";
/// Reply to `getGlobalSettings`.
pub const DID_RECEIVE_GLOBAL_SETTINGS: &str = "didReceiveGlobalSettings";
/// The property inspector opened.
pub const PROPERTY_INSPECTOR_DID_APPEAR: &str = "propertyInspectorDidAppear";
/// The property inspector closed.
pub const PROPERTY_INSPECTOR_DID_DISAPPEAR: &str = "propertyInspectorDidDisappear";
/// A message from the property inspector.
pub const DID_RECEIVE_PROPERTY_INSPECTOR_MESSAGE: &str = "didReceivePropertyInspectorMessage";

// Inbound: host scoped
/// The host computer woke from sleep.
pub const SYSTEM_DID_WAKE_UP: &str = "systemDidWakeUp";
/// A monitored application launched.
pub const APPLICATION_DID_LAUNCH: &str = "applicationDidLaunch";
/// A monitored application terminated.
pub const APPLICATION_DID_TERMINATE: &str = "applicationDidTerminate";
/// A device was connected.
pub const DEVICE_DID_CONNECT: &str = "deviceDidConnect";
/// A device was disconnected.
pub const DEVICE_DID_DISCONNECT: &str = "deviceDidDisconnect";
/// A deep link addressed to the plugin was opened.
pub const DID_RECEIVE_DEEP_LINK: &str = "didReceiveDeepLink";

// Both directions
/// Property inspector to plugin message.
pub const SEND_TO_PLUGIN: &str = "sendToPlugin";
/// Plugin to property inspector message.
pub const SEND_TO_PROPERTY_INSPECTOR: &str = "sendToPropertyInspector";

// Outbound
/// Persist settings for an action instance.
pub const SET_SETTINGS: &str = "setSettings";
/// Request settings for an action instance.
pub const GET_SETTINGS: &str = "getSettings";
/// Persist plugin-wide settings.
pub const SET_GLOBAL_SETTINGS: &str = "setGlobalSettings";
/// Request plugin-wide settings.
pub const GET_GLOBAL_SETTINGS: &str = "getGlobalSettings";
/// Open a URL in the default browser.
pub const OPEN_URL: &str = "openUrl";
/// Write a line to the host's plugin log.
pub const LOG_MESSAGE: &str = "logMessage";
/// Change an instance's title.
pub const SET_TITLE: &str = "setTitle";
/// Change an instance's image.
pub const SET_IMAGE: &str = "setImage";
/// Update values in an encoder layout.
pub const SET_FEEDBACK: &str = "setFeedback";
/// Switch an encoder layout.
pub const SET_FEEDBACK_LAYOUT: &str = "setFeedbackLayout";
/// Describe encoder triggers.
pub const SET_TRIGGER_DESCRIPTION: &str = "setTriggerDescription";
/// Flash a warning on an instance.
pub const SHOW_ALERT: &str = "showAlert";
/// Flash a checkmark on an instance.
pub const SHOW_OK: &str = "showOk";
/// Change an instance's state.
pub const SET_STATE: &str = "setState";
/// Switch the device to a bundled profile.
pub const SWITCH_TO_PROFILE: &str = "switchToProfile";
