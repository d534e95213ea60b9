//! Session management for the word-match client.
//!
//! This module provides the core session types:
//!
//! - `protocol` - Message vocabulary and JSON codec
//! - `connection` - Socket lifecycle over a pluggable transport
//! - `session` - The session state aggregate and its view projections
//! - `round` - Round state and outcomes
//! - `machine` - The state machine that owns and mutates session state
//! - `config` - Session settings
//! - `scores` - Score history request descriptor
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Session                               │
//! │                                                                  │
//! │  socket callbacks ──▶ ┌───────────────────┐  ServerMessage       │
//! │  (ConnectionEvent)    │ SessionConnection │ ─────────────┐       │
//! │                       │   + Transport     │              ▼       │
//! │                       └───────────────────┘     ┌────────────────┐│
//! │                                 ▲               │ SessionMachine ││
//! │                                 │ Outbox        │  SessionState  ││
//! │                                 └───────────────│                ││
//! │  commands (set_nickname, join_game, ...) ──────▶└────────────────┘│
//! │                                                     │            │
//! │                                   SessionNotice ◀───┘            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the caller's event queue: each event or command takes
//! `&mut Session` and runs to completion.

pub mod config;
pub mod connection;
pub mod error;
pub mod machine;
pub mod protocol;
pub mod round;
pub mod scores;
pub mod session;
pub mod testing;

use chrono::{DateTime, Utc};
use tracing::warn;

pub use config::SessionConfig;
pub use connection::{
    ConnectionEvent, ConnectionPhase, Outbox, Routed, SessionConnection, SessionEnd, Transport,
};
pub use error::{CommandRejected, ConfigError, DecodeError, ProtocolViolation, Result, SessionError};
pub use machine::{PendingCommand, SessionMachine, SessionNotice};
pub use protocol::{ClientMessage, ServerMessage};
pub use round::{RoundOutcome, RoundState};
pub use scores::ScoreRequest;
pub use session::{MatchmakingStatus, NicknameStatus, SessionId, SessionState, SessionView};

/// One client session: a connection coupled with the machine that owns the
/// session state.
#[derive(Debug)]
pub struct Session<T: Transport> {
    connection: SessionConnection<T>,
    machine: SessionMachine,
    config: SessionConfig,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            connection: SessionConnection::new(transport),
            machine: SessionMachine::with_config(&config),
            config,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    pub fn view(&self) -> SessionView {
        self.machine.state().view()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn connection(&self) -> &SessionConnection<T> {
        &self.connection
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.connection.transport_mut()
    }

    /// Start connecting to the game server.
    ///
    /// If the transport cannot even start connecting, the session ends.
    pub fn open(&mut self) -> Result<()> {
        if let Err(err) = self.connection.open() {
            if let Some(end) = self.connection.ended() {
                self.machine.on_end(end.clone());
            }
            return Err(err);
        }
        self.machine.on_connecting();
        Ok(())
    }

    /// Feed one socket event through the connection into the machine.
    ///
    /// A malformed frame yields [`SessionError::Decode`] and a message the
    /// current state cannot accept yields [`SessionError::Protocol`]. Either
    /// way the frame is discarded and the state is left untouched.
    pub fn handle_event(&mut self, event: ConnectionEvent) -> Result<Vec<SessionNotice>> {
        match self.connection.handle(event) {
            Routed::Opened => Ok(self.machine.on_open().into_iter().collect()),
            Routed::Message(message) => Ok(self.machine.dispatch(message)?),
            Routed::Malformed(err) => Err(err.into()),
            Routed::Ended(end) => Ok(self.machine.on_end(end).into_iter().collect()),
            Routed::Ignored => Ok(Vec::new()),
        }
    }

    pub fn set_nickname(&mut self, name: &str) -> Result<SessionNotice> {
        let result = self.machine.set_nickname(name, &mut self.connection);
        self.check_transport(result)
    }

    pub fn join_game(&mut self) -> Result<SessionNotice> {
        let result = self.machine.join_game(&mut self.connection);
        self.check_transport(result)
    }

    pub fn submit_word(&mut self, word: &str) -> Result<SessionNotice> {
        let result = self.machine.submit_word(word, &mut self.connection);
        self.check_transport(result)
    }

    /// A failed send means the socket is unusable; end the session.
    fn check_transport(&mut self, result: Result<SessionNotice>) -> Result<SessionNotice> {
        if let Err(SessionError::Transport(error)) = &result {
            warn!(%error, "send failed, ending session");
            // An end event never fails to route
            let _ = self.handle_event(ConnectionEvent::Error(error.clone()));
        }
        result
    }

    /// Close the socket from this side.
    pub fn close(&mut self, reason: &str) -> Option<SessionNotice> {
        let end = self.connection.close(reason)?;
        self.machine.on_end(end)
    }

    /// Outstanding command that has waited past its timeout, if any.
    pub fn stalled(&self, now: DateTime<Utc>) -> Option<PendingCommand> {
        self.machine.stalled(now)
    }

    /// Score history request for this session.
    pub fn score_request(&self) -> Result<ScoreRequest> {
        ScoreRequest::for_session(self.machine.state())
    }

    /// Score history URL under the configured gateway.
    pub fn score_url(&self, after_index: u64) -> Result<String> {
        let request = self.score_request()?.after(after_index);
        Ok(request.url(&self.config.gateway_root_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::testing::MemoryTransport;

    fn message(raw: &str) -> ConnectionEvent {
        ConnectionEvent::Message(raw.to_string())
    }

    fn joined() -> Session<MemoryTransport> {
        let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
        session.open().unwrap();
        session.handle_event(ConnectionEvent::Opened).unwrap();
        session
            .handle_event(message(r#"{"type":"CONNECT_RESPONSE","sessionId":"s-9"}"#))
            .unwrap();
        session
    }

    #[test]
    fn test_session_basic() {
        let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
        assert_eq!(session.state().connection_phase(), ConnectionPhase::Disconnected);

        session.open().unwrap();
        assert_eq!(session.state().connection_phase(), ConnectionPhase::Connecting);

        let notices = session.handle_event(ConnectionEvent::Opened).unwrap();
        assert_eq!(notices, vec![SessionNotice::Connected]);
        assert!(session.view().awaiting_connection);
        assert!(session.view().nickname_form_visible);

        session
            .handle_event(message(r#"{"type":"CONNECT_RESPONSE","sessionId":"s-9"}"#))
            .unwrap();
        assert!(!session.view().awaiting_connection);
    }

    #[test]
    fn test_commands_reach_transport() {
        let mut session = joined();
        session.set_nickname("bob").unwrap();
        assert_eq!(
            session.connection().transport().sent(),
            [r#"{"type":"SET_NICKNAME","nickname":"bob"}"#.to_string()]
        );
    }

    #[test]
    fn test_garbage_frames_do_not_disturb_state() {
        let mut session = joined();
        let before = session.state().clone();

        assert!(matches!(
            session.handle_event(message("<html>")),
            Err(SessionError::Decode(DecodeError::Json(_)))
        ));
        assert!(matches!(
            session.handle_event(message(r#"{"type":"WHATEVER"}"#)),
            Err(SessionError::Protocol(ProtocolViolation::Unrecognized(_)))
        ));
        assert!(matches!(
            session.handle_event(message(
                r#"{"type":"BROADCAST_WORD","word":"X","opponentNickname":"y"}"#
            )),
            Err(SessionError::Protocol(_))
        ));
        assert_eq!(session.state(), &before);

        // The session keeps working afterwards
        session.set_nickname("bob").unwrap();
    }

    #[test]
    fn test_failed_open_ends_session() {
        let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
        session.transport_mut().fail_connect("no route to host");

        let err = session.open().unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert!(session.state().is_ended());
        assert_eq!(session.state().connection_phase(), ConnectionPhase::Disconnected);
        assert!(session.view().awaiting_connection);
        assert!(matches!(session.open(), Err(SessionError::Ended)));
        assert!(matches!(
            session.set_nickname("bob"),
            Err(SessionError::Rejected(CommandRejected::SessionEnded))
        ));
    }

    #[test]
    fn test_send_failure_ends_session() {
        let mut session = joined();
        session.transport_mut().fail_sends("socket gone");

        let err = session.set_nickname("bob").unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert!(session.state().is_ended());
        assert_eq!(session.state().nickname_status(), NicknameStatus::Unset);
        assert_eq!(session.state().connection_phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn test_local_close() {
        let mut session = joined();
        let notice = session.close("bye").unwrap();
        assert!(matches!(notice, SessionNotice::ConnectionLost { .. }));
        assert!(session.close("bye").is_none());
        assert!(session.connection().transport().is_closed());
    }

    #[test]
    fn test_score_url() {
        let config = SessionConfig::default().with_gateway_root_url("https://gw.example");
        let mut session = Session::new(MemoryTransport::new(), config);
        assert!(matches!(session.score_url(0), Err(SessionError::NoSession)));

        session.open().unwrap();
        session.handle_event(ConnectionEvent::Opened).unwrap();
        session
            .handle_event(message(r#"{"type":"CONNECT_RESPONSE","sessionId":"s-9"}"#))
            .unwrap();
        assert_eq!(
            session.score_url(3).unwrap(),
            "https://gw.example/scores/s-9?afterIndex=3"
        );
    }
}
