//! Actions, their live instance contexts, and the action registry.
//!
//! An [`Action`] is created once per action identity, lazily, the first time
//! an event for it arrives or code asks for it. Every new action registers
//! two lifecycle handlers before anything else: `willAppear` adds the
//! instance-context id to the action's [`ContextTracker`], `willDisappear`
//! removes it. They run through the same registry as user handlers, so a
//! user `willAppear` handler registered later already sees the new instance.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use deckplug_core::payloads::{
    DialDownPayload, DialRotatePayload, DialUpPayload, DidReceivePropertyInspectorMessagePayload,
    DidReceiveSettingsPayload, KeyDownPayload, KeyUpPayload, PropertyInspectorDidAppearPayload,
    PropertyInspectorDidDisappearPayload, TitleParametersDidChangePayload, TouchTapPayload,
    WillAppearPayload, WillDisappearPayload,
};
use deckplug_core::{ContractViolation, Event, EventContext, TypedEvent, names};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::client::Client;
use crate::errors::HandlerError;
use crate::handler::{EventHandler, TypedHandler, handler_fn};
use crate::registry::HandlerRegistry;

// ─────────────────────────────────────────────────────────────────────────────
// Context tracker
// ─────────────────────────────────────────────────────────────────────────────

/// Set of live instance-context ids for one action.
///
/// Each id keeps the correlation context it appeared with so callers can
/// address every visible instance.
#[derive(Debug, Default)]
pub struct ContextTracker {
    live: DashMap<String, EventContext>,
}

impl ContextTracker {
    /// Mark `ctx.context()` live. Already-live ids are left as they are.
    ///
    /// # Panics
    ///
    /// Panics with a [`ContractViolation`] payload if the id is empty.
    pub fn add(&self, ctx: &EventContext) {
        let id = ctx.context();
        if id.is_empty() {
            violation("add context");
        }
        let _ = self.live.entry(id.to_owned()).or_insert_with(|| ctx.clone());
    }

    /// Forget `id`. Unknown ids are ignored.
    ///
    /// # Panics
    ///
    /// Panics with a [`ContractViolation`] payload if the id is empty.
    pub fn remove(&self, id: &str) {
        if id.is_empty() {
            violation("remove context");
        }
        let _ = self.live.remove(id);
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: &str) -> bool {
        self.live.contains_key(id)
    }

    /// Snapshot of live ids.
    pub fn ids(&self) -> HashSet<String> {
        self.live.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Snapshot of the correlation contexts of live instances.
    pub fn contexts(&self) -> Vec<EventContext> {
        self.live.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no instance is live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

fn violation(operation: &'static str) -> ! {
    let violation = ContractViolation::new(operation, "empty instance-context id");
    error!(%violation, "routing invariant broken");
    std::panic::panic_any(violation)
}

struct TrackAppearance(Arc<ContextTracker>);

#[async_trait]
impl EventHandler for TrackAppearance {
    async fn handle(
        &self,
        ctx: &EventContext,
        _client: &Client,
        _event: &Event,
    ) -> Result<(), HandlerError> {
        self.0.add(ctx);
        Ok(())
    }
}

struct TrackDisappearance(Arc<ContextTracker>);

#[async_trait]
impl EventHandler for TrackDisappearance {
    async fn handle(
        &self,
        ctx: &EventContext,
        _client: &Client,
        _event: &Event,
    ) -> Result<(), HandlerError> {
        self.0.remove(ctx.context());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Action
// ─────────────────────────────────────────────────────────────────────────────

/// One action identity with its handlers and live instances.
pub struct Action {
    uuid: String,
    handlers: HandlerRegistry,
    contexts: Arc<ContextTracker>,
}

impl Action {
    /// Create an action with the lifecycle handlers already registered.
    pub fn new(uuid: impl Into<String>) -> Self {
        let uuid = uuid.into();
        let contexts = Arc::new(ContextTracker::default());
        let handlers = HandlerRegistry::new(uuid.clone());
        handlers.register(names::WILL_APPEAR, TrackAppearance(Arc::clone(&contexts)));
        handlers.register(names::WILL_DISAPPEAR, TrackDisappearance(Arc::clone(&contexts)));
        Self {
            uuid,
            handlers,
            contexts,
        }
    }

    /// Action identity.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// This action's handler registry.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Register an untyped handler for `event_name`.
    pub fn register_handler(&self, event_name: &str, handler: impl EventHandler + 'static) {
        self.handlers.register(event_name, handler);
    }

    /// Register a closure for `event_name`.
    pub fn register_fn<F, Fut>(&self, event_name: &str, callback: F)
    where
        F: Fn(EventContext, Client, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.handlers.register(event_name, handler_fn(callback));
    }

    /// Register a callback that receives the payload decoded as `T`.
    pub fn register_typed<T, F, Fut>(&self, event_name: &str, callback: F)
    where
        T: DeserializeOwned + Default + Send + 'static,
        F: Fn(EventContext, Client, TypedEvent<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.handlers.register(event_name, TypedHandler::new(callback));
    }

    /// Register a `sendToPlugin` callback; the payload is the property
    /// inspector's message as sent.
    pub fn on_send_to_plugin<M, F, Fut>(&self, callback: F)
    where
        M: DeserializeOwned + Default + Send + 'static,
        F: Fn(EventContext, Client, TypedEvent<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.register_typed(names::SEND_TO_PLUGIN, callback);
    }

    /// Snapshot of live instance-context ids.
    pub fn live_contexts(&self) -> HashSet<String> {
        self.contexts.ids()
    }

    /// Snapshot of the correlation contexts of live instances.
    pub fn contexts(&self) -> Vec<EventContext> {
        self.contexts.contexts()
    }

    /// Run this action's handlers for `event`.
    pub async fn execute(
        &self,
        ctx: &EventContext,
        client: &Client,
        event: &Event,
    ) -> Result<(), HandlerError> {
        self.handlers.execute(ctx, client, event).await
    }
}

macro_rules! typed_helpers {
    ($($(#[$doc:meta])* $method:ident => $event:expr, $payload:ident;)*) => {
        impl Action {
            $(
                $(#[$doc])*
                pub fn $method<S, F, Fut>(&self, callback: F)
                where
                    S: DeserializeOwned + Default + Send + 'static,
                    F: Fn(EventContext, Client, TypedEvent<$payload<S>>) -> Fut
                        + Send
                        + Sync
                        + 'static,
                    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
                {
                    self.register_typed($event, callback);
                }
            )*
        }
    };
}

typed_helpers! {
    /// Register a typed `willAppear` callback.
    on_will_appear => names::WILL_APPEAR, WillAppearPayload;
    /// Register a typed `willDisappear` callback.
    on_will_disappear => names::WILL_DISAPPEAR, WillDisappearPayload;
    /// Register a typed `keyDown` callback.
    on_key_down => names::KEY_DOWN, KeyDownPayload;
    /// Register a typed `keyUp` callback.
    on_key_up => names::KEY_UP, KeyUpPayload;
    /// Register a typed `touchTap` callback.
    on_touch_tap => names::TOUCH_TAP, TouchTapPayload;
    /// Register a typed `dialDown` callback.
    on_dial_down => names::DIAL_DOWN, DialDownPayload;
    /// Register a typed `dialUp` callback.
    on_dial_up => names::DIAL_UP, DialUpPayload;
    /// Register a typed `dialRotate` callback.
    on_dial_rotate => names::DIAL_ROTATE, DialRotatePayload;
    /// Register a typed `didReceiveSettings` callback.
    on_did_receive_settings => names::DID_RECEIVE_SETTINGS, DidReceiveSettingsPayload;
    /// Register a typed `titleParametersDidChange` callback.
    on_title_parameters_did_change => names::TITLE_PARAMETERS_DID_CHANGE, TitleParametersDidChangePayload;
    /// Register a typed `propertyInspectorDidAppear` callback.
    on_property_inspector_did_appear => names::PROPERTY_INSPECTOR_DID_APPEAR, PropertyInspectorDidAppearPayload;
    /// Register a typed `propertyInspectorDidDisappear` callback.
    on_property_inspector_did_disappear => names::PROPERTY_INSPECTOR_DID_DISAPPEAR, PropertyInspectorDidDisappearPayload;
    /// Register a typed `didReceivePropertyInspectorMessage` callback.
    on_did_receive_property_inspector_message => names::DID_RECEIVE_PROPERTY_INSPECTOR_MESSAGE, DidReceivePropertyInspectorMessagePayload;
}

// ─────────────────────────────────────────────────────────────────────────────
// Action registry
// ─────────────────────────────────────────────────────────────────────────────

/// Action identity to [`Action`], created on first use.
#[derive(Default)]
pub struct ActionRegistry {
    actions: DashMap<String, Arc<Action>>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The action for `uuid`, creating it if needed. Concurrent callers with
    /// the same `uuid` all receive the same instance.
    pub fn get_or_create(&self, uuid: &str) -> Arc<Action> {
        if let Some(action) = self.actions.get(uuid) {
            return Arc::clone(action.value());
        }
        let entry = self.actions.entry(uuid.to_owned()).or_insert_with(|| {
            debug!(action = uuid, "creating action");
            Arc::new(Action::new(uuid))
        });
        Arc::clone(entry.value())
    }

    /// The action for `uuid`, if it exists.
    pub fn get(&self, uuid: &str) -> Option<Arc<Action>> {
        self.actions.get(uuid).map(|action| Arc::clone(action.value()))
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no action exists yet.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// All action identities (sorted).
    pub fn uuids(&self) -> Vec<String> {
        let mut uuids: Vec<String> = self.actions.iter().map(|a| a.key().clone()).collect();
        uuids.sort();
        uuids
    }
}
