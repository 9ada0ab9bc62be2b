//! WebSocket connection to the host.
//!
//! A [`Connection`] moves `Unconnected -> Connected -> Closed` and never back.
//! It owns the write half behind an async mutex so outbound frames are
//! written one at a time in arrival order. The read half is consumed by
//! [`Connection::read_loop`], which runs on its own task and fires the
//! completion signal when the transport ends.

use std::fmt;
use std::time::Duration;

use deckplug_core::{EnvelopeDecodeError, Event};
use deckplug_settings::RegistrationParams;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{ConnectError, SendError, TransportReadError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Read half handed to [`Connection::read_loop`].
pub type FrameSource = SplitStream<WsStream>;

type FrameSink = SplitSink<WsStream, Message>;

/// Lifecycle state of a [`Connection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not yet connected.
    Unconnected,
    /// Handshake done; reading and writing.
    Connected,
    /// Terminal.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconnected => "unconnected",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// One session's transport.
pub struct Connection {
    sink: tokio::sync::Mutex<Option<FrameSink>>,
    state: parking_lot::Mutex<ConnectionState>,
    done: CancellationToken,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
    close_timeout: Duration,
}

impl Connection {
    /// Create an unconnected connection whose `close()` waits at most
    /// `close_timeout`.
    pub fn new(close_timeout: Duration) -> Self {
        Self {
            sink: tokio::sync::Mutex::new(None),
            state: parking_lot::Mutex::new(ConnectionState::Unconnected),
            done: CancellationToken::new(),
            reader: parking_lot::Mutex::new(None),
            close_timeout,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Perform the WebSocket handshake and return the read half.
    ///
    /// On failure the connection stays `Unconnected`.
    pub async fn connect(&self, endpoint: &str) -> Result<FrameSource, ConnectError> {
        let mut sink = self.sink.lock().await;
        let state = self.state();
        if state != ConnectionState::Unconnected {
            return Err(ConnectError::InvalidState { state });
        }

        let (stream, _response) =
            connect_async(endpoint)
                .await
                .map_err(|source| ConnectError::Handshake {
                    endpoint: endpoint.to_owned(),
                    source: Box::new(source),
                })?;
        let (tx, rx) = stream.split();
        *sink = Some(tx);
        *self.state.lock() = ConnectionState::Connected;
        info!(endpoint, "connected to host");
        Ok(rx)
    }

    /// Remember the task running [`Self::read_loop`] so `close()` can stop it.
    pub fn attach_reader(&self, reader: JoinHandle<()>) {
        if let Some(previous) = self.reader.lock().replace(reader) {
            previous.abort();
        }
    }

    /// Read frames until the transport ends, passing each decoded envelope
    /// to `on_event`.
    ///
    /// Pings are answered with a pong and produce no envelope. A close frame
    /// from the host is acknowledged and ends the loop. Frames that do not
    /// decode are logged and skipped. `on_event` must not block; it is
    /// expected to hand the event off to another task.
    pub async fn read_loop<F>(&self, mut source: FrameSource, mut on_event: F)
    where
        F: FnMut(Event),
    {
        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Text(text)) => deliver(Event::decode(text.as_str()), &mut on_event),
                Ok(Message::Binary(bytes)) => deliver(Event::decode_slice(&bytes), &mut on_event),
                Ok(Message::Ping(_)) => self.flush_control().await,
                Ok(Message::Pong(_) | Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    info!(?frame, "host closed the connection");
                    self.flush_control().await;
                    break;
                }
                Err(err) => {
                    let err = TransportReadError(Box::new(err));
                    warn!(error = %err, "read loop ended");
                    break;
                }
            }
        }
        *self.state.lock() = ConnectionState::Closed;
        self.done.cancel();
        debug!("read loop finished");
    }

    // The WebSocket layer queues the pong or close reply itself; flushing
    // under the send lock keeps it from interleaving with an outbound frame.
    async fn flush_control(&self) {
        let mut sink = self.sink.lock().await;
        if let Some(sink) = sink.as_mut() {
            if let Err(err) = sink.flush().await {
                debug!(error = %err, "failed to flush control reply");
            }
        }
    }

    /// Encode `event` and write it. Writes are serialized in arrival order.
    pub async fn send(&self, event: &Event) -> Result<(), SendError> {
        let text = event.encode()?;
        let mut sink = self.sink.lock().await;
        match self.state() {
            ConnectionState::Unconnected => return Err(SendError::NotConnected),
            ConnectionState::Closed => return Err(SendError::Closed),
            ConnectionState::Connected => {}
        }
        let Some(sink) = sink.as_mut() else {
            return Err(SendError::NotConnected);
        };
        debug!(event_name = %event.event, "sending frame");
        sink.send(Message::text(text))
            .await
            .map_err(|err| SendError::Transport(Box::new(err)))
    }

    /// Send the registration frame. On failure the connection is closed.
    pub async fn register(&self, params: &RegistrationParams) -> Result<(), ConnectError> {
        let frame = Event::registration(&params.plugin_uuid, &params.register_event);
        if let Err(err) = self.send(&frame).await {
            warn!(error = %err, "registration failed, closing connection");
            self.close().await;
            return Err(ConnectError::Register(err));
        }
        info!(
            register_event = %params.register_event,
            "registered with host"
        );
        Ok(())
    }

    /// Close the session.
    ///
    /// Sends a normal-closure frame if the read loop is still running, waits
    /// for the loop to finish, then force-closes the transport. Never takes
    /// longer than the configured bound. Calling it again is a no-op.
    pub async fn close(&self) {
        let deadline = Instant::now() + self.close_timeout;
        let previous = std::mem::replace(&mut *self.state.lock(), ConnectionState::Closed);
        if previous == ConnectionState::Unconnected {
            self.done.cancel();
            return;
        }

        if previous == ConnectionState::Connected {
            match tokio::time::timeout_at(deadline, self.sink.lock()).await {
                Ok(mut sink) => {
                    if let Some(sink) = sink.as_mut() {
                        let frame = CloseFrame {
                            code: CloseCode::Normal,
                            reason: "".into(),
                        };
                        let sent =
                            tokio::time::timeout_at(deadline, sink.send(Message::Close(Some(frame))))
                                .await;
                        if !matches!(sent, Ok(Ok(()))) {
                            debug!("close frame not delivered");
                        }
                    }
                }
                Err(_elapsed) => debug!("send lock busy, skipping close frame"),
            }
        }

        if tokio::time::timeout_at(deadline, self.done.cancelled())
            .await
            .is_err()
        {
            warn!(
                timeout_ms = u64::try_from(self.close_timeout.as_millis()).unwrap_or(u64::MAX),
                "read loop did not finish in time, forcing close"
            );
        }

        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
        self.done.cancel();

        let sink = match tokio::time::timeout_at(deadline, self.sink.lock()).await {
            Ok(mut sink) => sink.take(),
            Err(_elapsed) => None,
        };
        if let Some(mut sink) = sink {
            let _ = tokio::time::timeout_at(deadline, sink.close()).await;
            info!("connection closed");
        }
    }

    /// Resolves once the read loop has finished or `close()` completed.
    pub async fn closed(&self) {
        self.done.cancelled().await;
    }

    /// Whether the read loop has finished or `close()` completed.
    pub fn is_closed(&self) -> bool {
        self.done.is_cancelled()
    }
}

fn deliver(decoded: Result<Event, EnvelopeDecodeError>, on_event: &mut impl FnMut(Event)) {
    match decoded {
        Ok(event) => {
            debug!(event_name = %event.event, action = %event.action, "frame received");
            on_event(event);
        }
        Err(err) => warn!(error = %err, "skipping undecodable frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn state_display() {
        assert_eq!(ConnectionState::Unconnected.to_string(), "unconnected");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }

    #[tokio::test]
    async fn send_before_connect_fails() {
        let conn = Connection::new(Duration::from_millis(100));
        let err = conn
            .send(&Event::registration("uuid", "registerPlugin"))
            .await
            .unwrap_err();
        assert_matches!(err, SendError::NotConnected);
    }

    #[tokio::test]
    async fn close_before_connect_is_immediate() {
        let conn = Connection::new(Duration::from_secs(30));
        tokio::time::timeout(Duration::from_secs(1), conn.close())
            .await
            .unwrap();
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn closed_connection_cannot_reconnect() {
        let conn = Connection::new(Duration::from_millis(100));
        conn.close().await;
        let err = conn.connect("ws://127.0.0.1:1").await.unwrap_err();
        assert_matches!(
            err,
            ConnectError::InvalidState {
                state: ConnectionState::Closed
            }
        );
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let conn = Connection::new(Duration::from_millis(100));
        conn.close().await;
        let err = conn
            .send(&Event::registration("uuid", "registerPlugin"))
            .await
            .unwrap_err();
        assert_matches!(err, SendError::Closed);
    }
}
