//! # deckplug-runtime
//!
//! Session runtime for a deckplug plugin process.
//!
//! - **Connection**: [`Connection`] owns the WebSocket to the host, a read
//!   loop that answers pings and decodes envelopes, serialized sends, and a
//!   bounded idempotent close
//! - **Handlers**: [`EventHandler`] trait, closure and typed adapters, and the
//!   per-owner [`HandlerRegistry`] with its ordered, mutually exclusive batches
//! - **Actions**: [`Action`] with its live [`ContextTracker`], created lazily
//!   through the [`ActionRegistry`]
//! - **Client**: [`Client`] ties it together: `start`/`run`, dispatch routing,
//!   error relaying, and the outbound primitives (`set_title`, `show_ok`, ...)

#![deny(unsafe_code)]

pub mod action;
pub mod client;
pub mod connection;
pub mod errors;
pub mod handler;
mod outbound;
pub mod registry;

#[cfg(test)]
mod test_helpers;

pub use action::{Action, ActionRegistry, ContextTracker};
pub use client::{Client, ClientBuilder, NO_ACTION_OWNER};
pub use connection::{Connection, ConnectionState, FrameSource};
pub use errors::{ConnectError, HandlerError, SendError, TransportReadError};
pub use handler::{EventHandler, FnHandler, TypedHandler, handler_fn};
pub use registry::HandlerRegistry;
