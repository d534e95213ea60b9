//! Connection state management.
//!
//! Owns the socket lifecycle through a [`Transport`] and turns raw frames into
//! typed messages. The socket itself lives outside this crate; the host feeds
//! its callbacks in as [`ConnectionEvent`]s.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{DecodeError, Result, SessionError};
use super::protocol::{ClientMessage, ServerMessage};

/// Lifecycle of the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionPhase {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// How a session came to an end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEnd {
    /// Socket closed by either side.
    Closed { code: Option<u16>, reason: String },
    /// Socket reported an error.
    Failed { error: String },
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed { code: Some(code), reason } => write!(f, "closed ({code}): {reason}"),
            Self::Closed { code: None, reason } => write!(f, "closed: {reason}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Socket callbacks, delivered in order on the session's event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened,
    Message(String),
    Closed { code: Option<u16>, reason: String },
    Error(String),
}

/// The underlying socket.
///
/// Implementations only move text frames; framing, handshake and encryption
/// are the environment's business.
pub trait Transport {
    /// Begin connecting. Completion is reported later as [`ConnectionEvent::Opened`].
    fn connect(&mut self) -> Result<()>;

    /// Transmit one text frame.
    fn send_text(&mut self, frame: String) -> Result<()>;

    /// Close the socket. Must tolerate being called on a closed socket.
    fn close(&mut self);
}

/// Opaque transmit operation handed to the state machine.
pub trait Outbox {
    fn transmit(&mut self, message: &ClientMessage) -> Result<()>;
}

/// Collects messages instead of sending them. Handy for driving the machine
/// without any socket.
impl Outbox for Vec<ClientMessage> {
    fn transmit(&mut self, message: &ClientMessage) -> Result<()> {
        self.push(message.clone());
        Ok(())
    }
}

/// What the connection made of one event.
#[derive(Debug)]
pub enum Routed {
    /// Socket finished opening.
    Opened,
    /// A decoded inbound message for the state machine.
    Message(ServerMessage),
    /// Frame could not be decoded and was discarded.
    Malformed(DecodeError),
    /// Socket is gone.
    Ended(SessionEnd),
    /// Nothing to do: repeated signal or frame after the end.
    Ignored,
}

/// One socket and its lifecycle.
#[derive(Debug)]
pub struct SessionConnection<T: Transport> {
    transport: T,
    phase: ConnectionPhase,
    /// Set once the socket closed or failed; never cleared.
    ended: Option<SessionEnd>,
    /// Frames received, including discarded ones
    received: u64,
    /// Frames sent
    sent: u64,
}

impl<T: Transport> SessionConnection<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            phase: ConnectionPhase::Disconnected,
            ended: None,
            received: 0,
            sent: 0,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn ended(&self) -> Option<&SessionEnd> {
        self.ended.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn frames_received(&self) -> u64 {
        self.received
    }

    pub fn frames_sent(&self) -> u64 {
        self.sent
    }

    /// Start a connection attempt.
    ///
    /// A transport failure here ends the connection; it cannot be reopened.
    pub fn open(&mut self) -> Result<()> {
        if self.ended.is_some() {
            return Err(SessionError::Ended);
        }
        if self.phase != ConnectionPhase::Disconnected {
            debug!(phase = %self.phase, "open ignored, connection already started");
            return Ok(());
        }
        if let Err(err) = self.transport.connect() {
            // A socket that never opened is as dead as one that closed.
            if let SessionError::Transport(error) = &err {
                self.on_end(SessionEnd::Failed {
                    error: error.clone(),
                });
            }
            return Err(err);
        }
        self.phase = ConnectionPhase::Connecting;
        info!("connecting to game server");
        Ok(())
    }

    /// Route one socket event.
    pub fn handle(&mut self, event: ConnectionEvent) -> Routed {
        match event {
            ConnectionEvent::Opened => self.on_open(),
            ConnectionEvent::Message(raw) => self.on_message(&raw),
            ConnectionEvent::Closed { code, reason } => {
                self.on_end(SessionEnd::Closed { code, reason })
            }
            ConnectionEvent::Error(error) => self.on_end(SessionEnd::Failed { error }),
        }
    }

    fn on_open(&mut self) -> Routed {
        if self.phase != ConnectionPhase::Connecting {
            debug!(phase = %self.phase, "open signal ignored");
            return Routed::Ignored;
        }
        self.phase = ConnectionPhase::Connected;
        info!("connected to game server");
        Routed::Opened
    }

    fn on_message(&mut self, raw: &str) -> Routed {
        self.received += 1;
        if self.ended.is_some() {
            warn!("frame received after session ended, discarding");
            return Routed::Ignored;
        }
        match ServerMessage::decode(raw) {
            Ok(message) => {
                debug!(kind = message.kind(), "received message");
                Routed::Message(message)
            }
            Err(err) => {
                warn!(error = %err, frame = raw, "discarding malformed frame");
                Routed::Malformed(err)
            }
        }
    }

    fn on_end(&mut self, end: SessionEnd) -> Routed {
        if self.ended.is_some() {
            debug!(%end, "repeated end signal ignored");
            return Routed::Ignored;
        }
        info!(%end, "connection ended");
        self.phase = ConnectionPhase::Disconnected;
        self.ended = Some(end.clone());
        Routed::Ended(end)
    }

    /// Serialize and transmit a command.
    ///
    /// Sending before the socket is open is a caller bug; it is reported,
    /// never queued or retried.
    pub fn send(&mut self, message: &ClientMessage) -> Result<()> {
        if !self.phase.is_connected() {
            return Err(SessionError::NotConnected { phase: self.phase });
        }
        let frame = message.encode()?;
        self.transport.send_text(frame)?;
        self.sent += 1;
        debug!(kind = message.kind(), "sent message");
        Ok(())
    }

    /// Close the socket locally. The session ends without waiting for the
    /// transport's own close callback.
    pub fn close(&mut self, reason: &str) -> Option<SessionEnd> {
        self.transport.close();
        match self.on_end(SessionEnd::Closed {
            code: None,
            reason: reason.to_string(),
        }) {
            Routed::Ended(end) => Some(end),
            _ => None,
        }
    }
}

impl<T: Transport> Outbox for SessionConnection<T> {
    fn transmit(&mut self, message: &ClientMessage) -> Result<()> {
        self.send(message)
    }
}
