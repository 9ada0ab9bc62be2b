//! Correlation context threaded through inbound dispatch and outbound sends.
//!
//! An [`EventContext`] carries the action identity, instance-context id and
//! device id of the event being processed, together with the caller's
//! cancellation token and an optional deadline. Deriving a context never
//! mutates the parent: every `with_*` call returns a new value whose
//! cancellation token is a child of the parent's, so cancelling the parent
//! also cancels everything derived from it.
//!
//! Cancellation is advisory. Nothing in the runtime interrupts a handler that
//! ignores it.

use std::fmt;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Fields carried by an [`EventContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextField {
    /// Action identity (`com.example.plugin.action`).
    Action,
    /// Instance-context id of one placed action instance.
    Context,
    /// Device id the instance lives on.
    Device,
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Action => "action",
            Self::Context => "context",
            Self::Device => "device",
        };
        f.write_str(name)
    }
}

/// Immutable correlation context.
#[derive(Clone, Debug, Default)]
pub struct EventContext {
    action: String,
    context: String,
    device: String,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl EventContext {
    /// A root context with no correlation ids, no deadline and a fresh
    /// cancellation token.
    pub fn background() -> Self {
        Self::default()
    }

    /// A root context observing an existing cancellation token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..Self::default()
        }
    }

    /// Derive a context with `field` set to `value`.
    #[must_use]
    pub fn with(&self, field: ContextField, value: impl Into<String>) -> Self {
        let mut derived = self.derive();
        let value = value.into();
        match field {
            ContextField::Action => derived.action = value,
            ContextField::Context => derived.context = value,
            ContextField::Device => derived.device = value,
        }
        derived
    }

    /// Derive a context with the action identity set.
    #[must_use]
    pub fn with_action(&self, action: impl Into<String>) -> Self {
        self.with(ContextField::Action, action)
    }

    /// Derive a context with the instance-context id set.
    #[must_use]
    pub fn with_context(&self, context: impl Into<String>) -> Self {
        self.with(ContextField::Context, context)
    }

    /// Derive a context with the device id set.
    #[must_use]
    pub fn with_device(&self, device: impl Into<String>) -> Self {
        self.with(ContextField::Device, device)
    }

    /// Derive a context carrying all three correlation ids at once.
    ///
    /// Used by the dispatch path for every inbound envelope.
    #[must_use]
    pub fn correlate(&self, action: &str, context: &str, device: &str) -> Self {
        let mut derived = self.derive();
        action.clone_into(&mut derived.action);
        context.clone_into(&mut derived.context);
        device.clone_into(&mut derived.device);
        derived
    }

    /// Derive a context that expires at `deadline`, or at the parent's
    /// deadline if that is earlier.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut derived = self.derive();
        derived.deadline = Some(self.deadline.map_or(deadline, |parent| parent.min(deadline)));
        derived
    }

    /// Derive a context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(&self, timeout: std::time::Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Read a field; empty if no enclosing `with` set it.
    pub fn get(&self, field: ContextField) -> &str {
        match field {
            ContextField::Action => &self.action,
            ContextField::Context => &self.context,
            ContextField::Device => &self.device,
        }
    }

    /// Action identity.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Instance-context id.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Device id.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// The effective deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The cancellation token observed by this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the context was cancelled or its deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancel.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }

    fn derive(&self) -> Self {
        Self {
            action: self.action.clone(),
            context: self.context.clone(),
            device: self.device.clone(),
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }
}
