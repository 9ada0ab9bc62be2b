//! Plugin client: session lifecycle and dispatch routing.
//!
//! ```text
//! frame ─► Connection::read_loop ─► spawn ─► Client::dispatch
//!                                              │
//!                        action empty? ────────┼──► global HandlerRegistry
//!                                              └──► ActionRegistry::get_or_create
//!                                                     └──► Action handlers
//! ```
//!
//! Each decoded envelope is dispatched on its own task so the read loop never
//! waits for handlers. Ordering is only guaranteed per (owner, event name).

use std::future::Future;
use std::sync::Arc;

use deckplug_core::{Event, EventContext, logging};
use deckplug_settings::{RegistrationParams, RuntimeSettings};
use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing::{debug, info, instrument, warn};

use crate::action::{Action, ActionRegistry};
use crate::connection::{Connection, ConnectionState};
use crate::errors::{ConnectError, HandlerError, SendError};
use crate::handler::{EventHandler, handler_fn};
use crate::registry::HandlerRegistry;

/// Owner name of the global (no-action) handler registry.
pub const NO_ACTION_OWNER: &str = "<no-action>";

struct ClientInner {
    root: EventContext,
    params: RegistrationParams,
    settings: RuntimeSettings,
    actions: ActionRegistry,
    global: HandlerRegistry,
    connection: Arc<Connection>,
    log_dispatch: Option<tracing::Dispatch>,
}

/// Handle to one plugin session. Cheap to clone.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    params: RegistrationParams,
    root: EventContext,
    settings: RuntimeSettings,
    log_dispatch: Option<tracing::Dispatch>,
}

impl ClientBuilder {
    /// Root correlation context; cancelling it ends [`Client::run`].
    #[must_use]
    pub fn context(mut self, root: EventContext) -> Self {
        self.root = root;
        self
    }

    /// Runtime settings.
    #[must_use]
    pub fn settings(mut self, settings: RuntimeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Subscriber every task spawned by the client logs to. Defaults to the
    /// subscriber current when `start()` runs.
    #[must_use]
    pub fn log_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.log_dispatch = Some(dispatch);
        self
    }

    /// Build the client. Nothing is connected yet.
    pub fn build(self) -> Client {
        let connection = Arc::new(Connection::new(self.settings.close_timeout()));
        Client {
            inner: Arc::new(ClientInner {
                root: self.root,
                params: self.params,
                settings: self.settings,
                actions: ActionRegistry::new(),
                global: HandlerRegistry::new(NO_ACTION_OWNER),
                connection,
                log_dispatch: self.log_dispatch,
            }),
        }
    }
}

impl Client {
    /// Create a client with an explicit root context and settings.
    pub fn new(root: EventContext, params: RegistrationParams, settings: RuntimeSettings) -> Self {
        Self::builder(params).context(root).settings(settings).build()
    }

    /// Start building a client for `params`.
    pub fn builder(params: RegistrationParams) -> ClientBuilder {
        ClientBuilder {
            params,
            root: EventContext::background(),
            settings: RuntimeSettings::default(),
            log_dispatch: None,
        }
    }

    /// Registration parameters.
    pub fn params(&self) -> &RegistrationParams {
        &self.inner.params
    }

    /// Runtime settings.
    pub fn settings(&self) -> &RuntimeSettings {
        &self.inner.settings
    }

    /// Root correlation context.
    pub fn root_context(&self) -> &EventContext {
        &self.inner.root
    }

    /// Connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// The action for `uuid`, created if needed.
    pub fn action(&self, uuid: &str) -> Arc<Action> {
        self.inner.actions.get_or_create(uuid)
    }

    /// All actions seen so far.
    pub fn actions(&self) -> &ActionRegistry {
        &self.inner.actions
    }

    /// Handlers for host-scoped events.
    pub fn no_action_handlers(&self) -> &HandlerRegistry {
        &self.inner.global
    }

    /// Register a handler for a host-scoped event such as
    /// `applicationDidLaunch` or `didReceiveGlobalSettings`.
    pub fn register_no_action_handler(&self, event_name: &str, handler: impl EventHandler + 'static) {
        self.inner.global.register(event_name, handler);
    }

    /// Closure form of [`Self::register_no_action_handler`].
    pub fn register_no_action_fn<F, Fut>(&self, event_name: &str, callback: F)
    where
        F: Fn(EventContext, Client, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.inner.global.register(event_name, handler_fn(callback));
    }

    /// Connect, start the read loop, and register.
    #[instrument(skip_all, fields(plugin_uuid = %self.inner.params.plugin_uuid, port = self.inner.params.port))]
    pub async fn start(&self) -> Result<(), ConnectError> {
        let endpoint = self.inner.settings.endpoint(self.inner.params.port);
        let source = self.inner.connection.connect(&endpoint).await?;

        let client = self.clone();
        let reader = tokio::spawn(self.instrumented(async move {
            let connection = Arc::clone(&client.inner.connection);
            connection
                .read_loop(source, |event| {
                    let task_client = client.clone();
                    let task = async move {
                        let _ = task_client.dispatch(event).await;
                    };
                    drop(tokio::spawn(client.instrumented(task)));
                })
                .await;
        }));
        self.inner.connection.attach_reader(reader);

        self.inner.connection.register(&self.inner.params).await
    }

    /// Install the stderr subscriber at `settings.log_level`, unless a
    /// dispatch was injected through [`ClientBuilder::log_dispatch`].
    ///
    /// Returns whether a subscriber was installed.
    pub fn init_logging(&self) -> bool {
        if self.inner.log_dispatch.is_some() {
            return false;
        }
        logging::init_subscriber(&self.inner.settings.log_level)
    }

    /// Set up logging, start, then block until the host closes the session,
    /// the root context is cancelled, or the process is interrupted.
    pub async fn run(&self) -> Result<(), ConnectError> {
        let _ = self.init_logging();
        self.start().await?;
        tokio::select! {
            () = self.inner.connection.closed() => info!("host closed the session"),
            () = self.inner.root.cancelled() => {
                info!("root context cancelled, closing session");
                self.close().await;
            }
            () = interrupted() => {
                info!("interrupt received, closing session");
                self.close().await;
            }
        }
        Ok(())
    }

    /// Route one envelope to its handlers and return the batch result.
    #[instrument(skip_all, fields(event_name = %event.event, action = %event.action, context = %event.context))]
    pub async fn dispatch(&self, event: Event) -> Result<(), HandlerError> {
        if event.action.is_empty() != event.context.is_empty() {
            warn!("envelope sets only one of action and context");
        }
        let ctx = self
            .inner
            .root
            .correlate(&event.action, &event.context, &event.device);

        let result = if event.is_no_action() {
            self.inner.global.execute(&ctx, self, &event).await
        } else {
            let action = self.inner.actions.get_or_create(&event.action);
            action.execute(&ctx, self, &event).await
        };

        if let Err(err) = &result {
            warn!(error = %err, "handler batch failed");
            if self.inner.settings.report_handler_errors {
                let message = format!("{} handler failed: {err}", event.event);
                if let Err(send_err) = self.log_message(&ctx, &message).await {
                    debug!(error = %send_err, "could not relay handler error to host");
                }
            }
        }
        result
    }

    /// Write one envelope.
    pub async fn send(&self, event: &Event) -> Result<(), SendError> {
        self.inner.connection.send(event).await
    }

    /// Close the session. Idempotent and bounded by `close_timeout_ms`.
    pub async fn close(&self) {
        self.inner.connection.close().await;
    }

    /// Resolves once the session has ended.
    pub async fn closed(&self) {
        self.inner.connection.closed().await;
    }

    fn instrumented<F: Future>(&self, future: F) -> WithDispatch<F> {
        let dispatch = self
            .inner
            .log_dispatch
            .clone()
            .unwrap_or_else(|| tracing::dispatcher::get_default(Clone::clone));
        future.with_subscriber(dispatch)
    }
}

async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for interrupt signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{Recorder, offline_client, offline_client_with};
    use assert_matches::assert_matches;
    use deckplug_core::logging::capture_logs;
    use deckplug_core::names;
    use tracing::Level;

    fn envelope(action: &str, name: &str, context: &str) -> Event {
        Event {
            action: action.into(),
            event: name.into(),
            context: context.into(),
            ..Event::default()
        }
    }

    #[tokio::test]
    async fn no_action_routes_by_event_name() {
        let client = offline_client();
        let recorder = Recorder::default();
        client.register_no_action_handler(names::APPLICATION_DID_LAUNCH, recorder.handler("launch"));
        client.register_no_action_handler(names::SYSTEM_DID_WAKE_UP, recorder.handler("wake"));
        client.register_no_action_handler(names::DEVICE_DID_CONNECT, recorder.handler("device"));

        client
            .dispatch(envelope("", names::SYSTEM_DID_WAKE_UP, ""))
            .await
            .unwrap();
        client
            .dispatch(envelope("", names::DEVICE_DID_CONNECT, ""))
            .await
            .unwrap();
        assert_eq!(recorder.calls(), ["wake", "device"]);
        assert!(client.actions().is_empty());
    }

    #[tokio::test]
    async fn action_events_create_action() {
        let client = offline_client();
        client
            .dispatch(envelope("com.example.counter", names::WILL_APPEAR, "c1"))
            .await
            .unwrap();

        let action = client.actions().get("com.example.counter").unwrap();
        assert!(action.live_contexts().contains("c1"));
    }

    #[tokio::test]
    async fn action_handlers_receive_correlated_context() {
        let client = offline_client();
        let seen = Arc::new(parking_lot::Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            client.action("x").register_fn(
                names::KEY_UP,
                move |ctx: EventContext, _client: Client, _event: Event| {
                    let seen = Arc::clone(&seen);
                    async move {
                        *seen.lock() = Some((
                            ctx.action().to_owned(),
                            ctx.context().to_owned(),
                            ctx.device().to_owned(),
                        ));
                        Ok(())
                    }
                },
            );
        }

        let mut event = envelope("x", names::KEY_UP, "c9");
        event.device = "dev".into();
        client.dispatch(event).await.unwrap();
        assert_eq!(
            seen.lock().clone(),
            Some(("x".to_owned(), "c9".to_owned(), "dev".to_owned()))
        );
    }

    #[tokio::test]
    async fn owners_are_independent() {
        let client = offline_client();
        let recorder = Recorder::default();
        client.action("a").register_handler(names::KEY_DOWN, recorder.handler("a"));
        client.action("b").register_handler(names::KEY_DOWN, recorder.handler("b"));
        client.register_no_action_handler(names::KEY_DOWN, recorder.handler("global"));

        client
            .dispatch(envelope("b", names::KEY_DOWN, "c"))
            .await
            .unwrap();
        assert_eq!(recorder.calls(), ["b"]);
    }

    #[tokio::test]
    async fn batch_error_is_returned_and_logged() {
        let (logs, _guard) = capture_logs();
        let client = offline_client();
        let recorder = Recorder::default();
        client
            .action("x")
            .register_handler(names::KEY_DOWN, recorder.failing("h", "bad key"));

        let err = client
            .dispatch(envelope("x", names::KEY_DOWN, "c"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bad key");
        assert!(logs.has_event(Level::WARN, "handler batch failed"));
        assert!(logs.has_message("could not relay handler error"));
    }

    #[tokio::test]
    async fn reporting_can_be_disabled() {
        let (logs, _guard) = capture_logs();
        let client = offline_client_with(RuntimeSettings {
            report_handler_errors: false,
            ..RuntimeSettings::default()
        });
        client
            .action("x")
            .register_handler(names::KEY_DOWN, Recorder::default().failing("h", "bad"));

        let _ = client.dispatch(envelope("x", names::KEY_DOWN, "c")).await;
        assert!(!logs.has_message("could not relay handler error"));
    }

    #[tokio::test]
    async fn send_without_start_fails() {
        let client = offline_client();
        let err = client.show_ok(&EventContext::background()).await.unwrap_err();
        assert_matches!(err, SendError::NotConnected);
        assert_eq!(client.connection_state(), ConnectionState::Unconnected);
    }

    #[tokio::test]
    async fn start_against_closed_port_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = Client::builder(RegistrationParams::new(port, "PLUGIN", "registerPlugin"))
            .build();
        assert_matches!(client.start().await, Err(ConnectError::Handshake { .. }));
        assert_eq!(client.connection_state(), ConnectionState::Unconnected);
    }

    #[test]
    fn injected_dispatch_skips_global_subscriber() {
        let (_logs, dispatch) = deckplug_core::logging::capture_dispatch();
        let client = Client::builder(RegistrationParams::new(9, "PLUGIN", "registerPlugin"))
            .settings(RuntimeSettings {
                log_level: "debug".into(),
                ..RuntimeSettings::default()
            })
            .log_dispatch(dispatch)
            .build();
        assert!(!client.init_logging());
    }

    #[test]
    fn init_logging_installs_once() {
        let client = offline_client_with(RuntimeSettings {
            log_level: "debug".into(),
            ..RuntimeSettings::default()
        });
        let _ = client.init_logging();
        assert!(!client.init_logging());
    }

    #[test]
    fn builder_defaults() {
        let client = Client::builder(RegistrationParams::new(9, "PLUGIN", "registerPlugin")).build();
        assert_eq!(client.params().port, 9);
        assert_eq!(client.settings(), &RuntimeSettings::default());
        assert!(!client.root_context().is_cancelled());
        assert_eq!(client.no_action_handlers().owner(), NO_ACTION_OWNER);
    }
}
