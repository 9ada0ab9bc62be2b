//! Runtime error types.

use std::time::Duration;

use deckplug_core::{EnvelopeEncodeError, PayloadDecodeError};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::connection::ConnectionState;

/// Opening or registering a session failed.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The WebSocket handshake with the host failed.
    #[error("websocket handshake with {endpoint} failed: {source}")]
    Handshake {
        /// Endpoint that was dialed.
        endpoint: String,
        /// Transport error.
        #[source]
        source: Box<tungstenite::Error>,
    },
    /// The connection was already used.
    #[error("cannot connect: connection is {state}")]
    InvalidState {
        /// State found at connect time.
        state: ConnectionState,
    },
    /// The registration frame could not be sent.
    #[error("registration failed: {0}")]
    Register(#[source] SendError),
}

/// An outbound frame could not be written.
#[derive(Debug, Error)]
pub enum SendError {
    /// `send` before `connect`.
    #[error("connection is not connected")]
    NotConnected,
    /// `send` after the connection closed.
    #[error("connection is closed")]
    Closed,
    /// The envelope could not be serialized.
    #[error(transparent)]
    Encode(#[from] EnvelopeEncodeError),
    /// The transport rejected the write.
    #[error("websocket write failed: {0}")]
    Transport(#[source] Box<tungstenite::Error>),
}

/// The transport failed while reading; ends the read loop.
#[derive(Debug, Error)]
#[error("websocket read failed: {0}")]
pub struct TransportReadError(#[source] pub Box<tungstenite::Error>);

/// A handler invocation failed.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A typed adapter could not decode the payload.
    #[error(transparent)]
    PayloadDecode(#[from] PayloadDecodeError),
    /// The handler's outbound send failed.
    #[error(transparent)]
    Send(#[from] SendError),
    /// The handler exceeded the configured bound.
    #[error("{event_name} handler timed out after {timeout:?}")]
    TimedOut {
        /// Event being handled.
        event_name: String,
        /// Configured bound.
        timeout: Duration,
    },
    /// The handler panicked.
    #[error("{event_name} handler panicked: {message}")]
    Panicked {
        /// Event being handled.
        event_name: String,
        /// Panic message, if it was a string.
        message: String,
    },
    /// Any other failure raised by user code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// Wrap an ad-hoc message.
    pub fn msg<M>(message: M) -> Self
    where
        M: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        Self::Other(anyhow::Error::msg(message))
    }
}
