//! Outbound primitives.
//!
//! Every method builds one envelope correlated from the given context and
//! writes it through [`Client::send`]. Host-scoped requests (global settings,
//! profile switching) are addressed with the plugin uuid as context.

use deckplug_core::payloads::{
    LogMessagePayload, OpenUrlPayload, SetFeedbackLayoutPayload, SetImagePayload, SetStatePayload,
    SetTitlePayload, SetTriggerDescriptionPayload, SwitchProfilePayload, Target,
};
use deckplug_core::{Event, EventContext, names};
use serde::Serialize;

use crate::client::Client;
use crate::errors::SendError;

impl Client {
    /// Persist per-instance settings.
    pub async fn set_settings<T: Serialize + ?Sized>(
        &self,
        ctx: &EventContext,
        settings: &T,
    ) -> Result<(), SendError> {
        self.send(&Event::with_payload(ctx, names::SET_SETTINGS, settings)?)
            .await
    }

    /// Ask the host for per-instance settings; they arrive as `didReceiveSettings`.
    pub async fn get_settings(&self, ctx: &EventContext) -> Result<(), SendError> {
        self.send(&Event::new(ctx, names::GET_SETTINGS)).await
    }

    /// Persist plugin-wide settings.
    pub async fn set_global_settings<T: Serialize + ?Sized>(
        &self,
        settings: &T,
    ) -> Result<(), SendError> {
        let event = Event::with_payload(
            &self.plugin_scope(),
            names::SET_GLOBAL_SETTINGS,
            settings,
        )?;
        self.send(&event).await
    }

    /// Ask the host for plugin-wide settings; they arrive as
    /// `didReceiveGlobalSettings`.
    pub async fn get_global_settings(&self) -> Result<(), SendError> {
        self.send(&Event::new(&self.plugin_scope(), names::GET_GLOBAL_SETTINGS))
            .await
    }

    /// Open `url` in the default browser.
    pub async fn open_url(&self, ctx: &EventContext, url: &str) -> Result<(), SendError> {
        let payload = OpenUrlPayload { url: url.to_owned() };
        self.send(&Event::with_payload(ctx, names::OPEN_URL, &payload)?)
            .await
    }

    /// Write a line to the host's plugin log.
    pub async fn log_message(&self, ctx: &EventContext, message: &str) -> Result<(), SendError> {
        let payload = LogMessagePayload {
            message: message.to_owned(),
        };
        self.send(&Event::with_payload(ctx, names::LOG_MESSAGE, &payload)?)
            .await
    }

    /// Change the title of an instance. `state` of `None` updates every state.
    pub async fn set_title(
        &self,
        ctx: &EventContext,
        title: &str,
        target: Target,
        state: Option<u32>,
    ) -> Result<(), SendError> {
        let payload = SetTitlePayload {
            title: title.to_owned(),
            target,
            state,
        };
        self.send(&Event::with_payload(ctx, names::SET_TITLE, &payload)?)
            .await
    }

    /// Change the image of an instance. `image` is a data URL or SVG.
    pub async fn set_image(
        &self,
        ctx: &EventContext,
        image: &str,
        target: Target,
        state: Option<u32>,
    ) -> Result<(), SendError> {
        let payload = SetImagePayload {
            image: image.to_owned(),
            target,
            state,
        };
        self.send(&Event::with_payload(ctx, names::SET_IMAGE, &payload)?)
            .await
    }

    /// Update touch display feedback items (encoder actions).
    pub async fn set_feedback<T: Serialize + ?Sized>(
        &self,
        ctx: &EventContext,
        feedback: &T,
    ) -> Result<(), SendError> {
        self.send(&Event::with_payload(ctx, names::SET_FEEDBACK, feedback)?)
            .await
    }

    /// Switch the touch display layout (encoder actions).
    pub async fn set_feedback_layout(
        &self,
        ctx: &EventContext,
        layout: &str,
    ) -> Result<(), SendError> {
        let payload = SetFeedbackLayoutPayload {
            layout: layout.to_owned(),
        };
        self.send(&Event::with_payload(ctx, names::SET_FEEDBACK_LAYOUT, &payload)?)
            .await
    }

    /// Override the trigger descriptions shown for an encoder instance.
    pub async fn set_trigger_description(
        &self,
        ctx: &EventContext,
        descriptions: &SetTriggerDescriptionPayload,
    ) -> Result<(), SendError> {
        self.send(&Event::with_payload(
            ctx,
            names::SET_TRIGGER_DESCRIPTION,
            descriptions,
        )?)
        .await
    }

    /// Flash the alert indicator on an instance.
    pub async fn show_alert(&self, ctx: &EventContext) -> Result<(), SendError> {
        self.send(&Event::new(ctx, names::SHOW_ALERT)).await
    }

    /// Flash the OK indicator on an instance.
    pub async fn show_ok(&self, ctx: &EventContext) -> Result<(), SendError> {
        self.send(&Event::new(ctx, names::SHOW_OK)).await
    }

    /// Set the state of a multi-state instance.
    pub async fn set_state(&self, ctx: &EventContext, state: u32) -> Result<(), SendError> {
        let payload = SetStatePayload { state };
        self.send(&Event::with_payload(ctx, names::SET_STATE, &payload)?)
            .await
    }

    /// Switch the device in `ctx` to a profile bundled with the plugin.
    /// An empty `profile` returns to the previous profile.
    pub async fn switch_to_profile(
        &self,
        ctx: &EventContext,
        profile: &str,
        page: Option<u32>,
    ) -> Result<(), SendError> {
        let payload = SwitchProfilePayload {
            profile: profile.to_owned(),
            page,
        };
        let scope = self.plugin_scope().with_device(ctx.device());
        self.send(&Event::with_payload(&scope, names::SWITCH_TO_PROFILE, &payload)?)
            .await
    }

    /// Send a message to the property inspector of an instance.
    pub async fn send_to_property_inspector<T: Serialize + ?Sized>(
        &self,
        ctx: &EventContext,
        message: &T,
    ) -> Result<(), SendError> {
        self.send(&Event::with_payload(
            ctx,
            names::SEND_TO_PROPERTY_INSPECTOR,
            message,
        )?)
        .await
    }

    /// Send a message to the plugin as if from the property inspector.
    pub async fn send_to_plugin<T: Serialize + ?Sized>(
        &self,
        ctx: &EventContext,
        message: &T,
    ) -> Result<(), SendError> {
        self.send(&Event::with_payload(ctx, names::SEND_TO_PLUGIN, message)?)
            .await
    }

    fn plugin_scope(&self) -> EventContext {
        EventContext::background().with_context(self.params().plugin_uuid.clone())
    }
}
