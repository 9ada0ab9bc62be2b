//! Handler registry and execution policy.
//!
//! One registry exists per owner (each action, plus the global no-action
//! owner). Handlers are appended per event name and never removed.
//!
//! `execute` runs every handler for the event's name in registration order
//! while holding that name's execution lock, so at most one batch per
//! (owner, event name) is in flight. A failing handler does not stop the
//! batch; the last error is returned. Different names and different owners
//! run concurrently.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use deckplug_core::{ContractViolation, Event, EventContext};
use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::client::Client;
use crate::errors::HandlerError;
use crate::handler::EventHandler;

#[derive(Default)]
struct HandlerBucket {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
    running: tokio::sync::Mutex<()>,
}

/// Event name to ordered handler list, for one owner.
pub struct HandlerRegistry {
    owner: String,
    buckets: DashMap<String, Arc<HandlerBucket>>,
}

impl HandlerRegistry {
    /// Create an empty registry for `owner` (used in logs).
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            buckets: DashMap::new(),
        }
    }

    /// Owner name.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Append a handler for `event_name`.
    pub fn register(&self, event_name: &str, handler: impl EventHandler + 'static) {
        self.register_arc(event_name, Arc::new(handler));
    }

    /// Append an already shared handler for `event_name`.
    ///
    /// A registration racing an in-flight batch for the same name takes
    /// effect from the next batch.
    pub fn register_arc(&self, event_name: &str, handler: Arc<dyn EventHandler>) {
        let bucket = Arc::clone(
            self.buckets
                .entry(event_name.to_owned())
                .or_default()
                .value(),
        );
        bucket.handlers.write().push(handler);
        debug!(owner = %self.owner, event_name, "handler registered");
    }

    /// Run every handler registered for `event.event`.
    pub async fn execute(
        &self,
        ctx: &EventContext,
        client: &Client,
        event: &Event,
    ) -> Result<(), HandlerError> {
        let Some(bucket) = self.buckets.get(&event.event).map(|b| Arc::clone(b.value())) else {
            debug!(owner = %self.owner, event_name = %event.event, "no handlers registered");
            return Ok(());
        };

        let _running = bucket.running.lock().await;
        let handlers = bucket.handlers.read().clone();
        let timeout = client.settings().handler_timeout();

        let mut last_error = None;
        for (index, handler) in handlers.iter().enumerate() {
            if let Err(err) = invoke(handler.as_ref(), ctx, client, event, timeout).await {
                warn!(
                    owner = %self.owner,
                    event_name = %event.event,
                    index,
                    error = %err,
                    "handler failed"
                );
                last_error = Some(err);
            }
        }
        last_error.map_or(Ok(()), Err)
    }

    /// Number of handlers registered for `event_name`.
    pub fn handler_count(&self, event_name: &str) -> usize {
        self.buckets
            .get(event_name)
            .map_or(0, |bucket| bucket.handlers.read().len())
    }

    /// All event names with at least one handler (sorted).
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.iter().map(|b| b.key().clone()).collect();
        names.sort();
        names
    }
}

async fn invoke(
    handler: &dyn EventHandler,
    ctx: &EventContext,
    client: &Client,
    event: &Event,
    timeout: Option<Duration>,
) -> Result<(), HandlerError> {
    let call = AssertUnwindSafe(handler.handle(ctx, client, event)).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                return Err(HandlerError::TimedOut {
                    event_name: event.event.clone(),
                    timeout: limit,
                });
            }
        },
        None => call.await,
    };
    outcome.unwrap_or_else(|panic| Err(panicked(&event.event, panic.as_ref())))
}

fn panicked(event_name: &str, payload: &(dyn Any + Send)) -> HandlerError {
    if let Some(violation) = payload.downcast_ref::<ContractViolation>() {
        error!(
            operation = violation.operation,
            detail = %violation.detail,
            "contract violation during dispatch, aborting"
        );
        std::process::abort();
    }
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    error!(event_name, %message, "handler panicked");
    HandlerError::Panicked {
        event_name: event_name.to_owned(),
        message,
    }
}
