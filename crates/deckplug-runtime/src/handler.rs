//! Handler contract.
//!
//! Two layers: [`EventHandler`] works on the raw [`Event`] and is what the
//! registries store; [`TypedHandler`] decodes the payload first and hands a
//! [`TypedEvent`] to a strongly typed callback. Routing never looks at the
//! payload, only at the event name.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use deckplug_core::{Event, EventContext, TypedEvent};
use serde::de::DeserializeOwned;

use crate::client::Client;
use crate::errors::HandlerError;

/// Trait implemented by every event handler.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event. `ctx` is correlated with the event's action,
    /// context and device.
    async fn handle(
        &self,
        ctx: &EventContext,
        client: &Client,
        event: &Event,
    ) -> Result<(), HandlerError>;
}

/// Adapter for closures over owned arguments.
pub struct FnHandler<F> {
    callback: F,
}

/// Wrap a closure as an [`EventHandler`].
pub fn handler_fn<F, Fut>(callback: F) -> FnHandler<F>
where
    F: Fn(EventContext, Client, Event) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    FnHandler { callback }
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(EventContext, Client, Event) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(
        &self,
        ctx: &EventContext,
        client: &Client,
        event: &Event,
    ) -> Result<(), HandlerError> {
        (self.callback)(ctx.clone(), client.clone(), event.clone()).await
    }
}

/// Decodes the payload into `T`, then calls the wrapped callback.
///
/// A payload that does not match `T` fails with
/// [`HandlerError::PayloadDecode`] and the callback is not called. An absent
/// payload yields `T::default()`.
pub struct TypedHandler<T, F> {
    callback: F,
    _payload: PhantomData<fn() -> T>,
}

impl<T, F, Fut> TypedHandler<T, F>
where
    T: DeserializeOwned + Default + Send + 'static,
    F: Fn(EventContext, Client, TypedEvent<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    /// Wrap a typed callback.
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _payload: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, Fut> EventHandler for TypedHandler<T, F>
where
    T: DeserializeOwned + Default + Send + 'static,
    F: Fn(EventContext, Client, TypedEvent<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(
        &self,
        ctx: &EventContext,
        client: &Client,
        event: &Event,
    ) -> Result<(), HandlerError> {
        let typed = event.to_typed::<T>()?;
        (self.callback)(ctx.clone(), client.clone(), typed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::offline_client;
    use assert_matches::assert_matches;
    use deckplug_core::payloads::KeyDownPayload;
    use deckplug_core::{Payload, names};
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Default, Deserialize)]
    struct Counter {
        #[serde(default)]
        counter: i64,
    }

    fn key_down(payload: Option<Payload>) -> Event {
        Event {
            action: "x".into(),
            event: names::KEY_DOWN.into(),
            context: "c1".into(),
            payload,
            ..Event::default()
        }
    }

    #[tokio::test]
    async fn fn_handler_receives_owned_arguments() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let handler = handler_fn(move |ctx: EventContext, _client: Client, event: Event| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock() = Some((ctx.context().to_owned(), event.event));
                Ok(())
            }
        });

        let client = offline_client();
        let ctx = EventContext::background().with_context("c1");
        handler.handle(&ctx, &client, &key_down(None)).await.unwrap();
        assert_eq!(
            seen.lock().clone(),
            Some(("c1".to_owned(), names::KEY_DOWN.to_owned()))
        );
    }

    #[tokio::test]
    async fn typed_handler_decodes_counter() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let handler = TypedHandler::new(
            move |_ctx: EventContext, _client: Client, event: TypedEvent<KeyDownPayload<Counter>>| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock() = Some(event.payload.settings.counter);
                    Ok(())
                }
            },
        );

        let event = key_down(Some(Payload::Json(json!({"settings": {"counter": 5}}))));
        handler
            .handle(&EventContext::background(), &offline_client(), &event)
            .await
            .unwrap();
        assert_eq!(*seen.lock(), Some(5));
    }

    #[tokio::test]
    async fn typed_handler_absent_payload_is_default() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let handler = TypedHandler::new(
            move |_ctx: EventContext, _client: Client, event: TypedEvent<KeyDownPayload<Counter>>| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock() = Some(event.payload.settings.counter);
                    Ok(())
                }
            },
        );

        handler
            .handle(&EventContext::background(), &offline_client(), &key_down(None))
            .await
            .unwrap();
        assert_eq!(*seen.lock(), Some(0));
    }

    #[tokio::test]
    async fn typed_handler_mismatch_skips_callback() {
        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);
        let handler = TypedHandler::new(
            move |_ctx: EventContext, _client: Client, _event: TypedEvent<KeyDownPayload<Counter>>| {
                let flag = Arc::clone(&flag);
                async move {
                    *flag.lock() = true;
                    Ok(())
                }
            },
        );

        let event = key_down(Some(Payload::raw(r#"{"settings": {"counter": 5}"#)));
        let err = handler
            .handle(&EventContext::background(), &offline_client(), &event)
            .await
            .unwrap_err();
        assert_matches!(err, HandlerError::PayloadDecode(e) if e.event_name == names::KEY_DOWN);
        assert!(!*called.lock());
    }
}
