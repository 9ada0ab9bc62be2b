//! Shared fixtures for unit tests.

use std::sync::Arc;

use deckplug_core::{Event, EventContext};
use deckplug_settings::{RegistrationParams, RuntimeSettings};
use parking_lot::Mutex;

use crate::client::Client;
use crate::errors::HandlerError;
use crate::handler::{EventHandler, handler_fn};

/// A client that never connects.
pub fn offline_client() -> Client {
    offline_client_with(RuntimeSettings::default())
}

/// A client that never connects, with custom settings.
pub fn offline_client_with(settings: RuntimeSettings) -> Client {
    Client::new(
        EventContext::background(),
        RegistrationParams::new(1, "PLUGIN", "registerPlugin"),
        settings,
    )
}

/// Records the label of every handler it hands out, in call order.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    /// Labels in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// A handler that records `label` and succeeds.
    pub fn handler(&self, label: &str) -> impl EventHandler + 'static {
        self.build(label, None)
    }

    /// A handler that records `label` and fails with `message`.
    pub fn failing(&self, label: &str, message: &'static str) -> impl EventHandler + 'static {
        self.build(label, Some(message))
    }

    fn build(&self, label: &str, failure: Option<&'static str>) -> impl EventHandler + 'static {
        let calls = Arc::clone(&self.calls);
        let label = label.to_owned();
        handler_fn(move |_ctx: EventContext, _client: Client, _event: Event| {
            calls.lock().push(label.clone());
            async move { failure.map_or(Ok(()), |message| Err(HandlerError::msg(message))) }
        })
    }
}
