//! Word-match Session Library
//!
//! Client-side session controller for a real-time two-player word-matching
//! game.
//!
//! # Overview
//!
//! - **Session Connection** - Owns the socket lifecycle through a pluggable
//!   transport, encodes outgoing commands and decodes incoming messages.
//!
//! - **Session State Machine** - Holds all session state (identity,
//!   matchmaking, round, outcome) and validates every message and command
//!   against it.
//!
//! - **Projections** - Read-only views over the state for a UI layer.
//!
//! # Design Principles
//!
//! 1. **State machines validate transitions** - Messages arriving in the wrong
//!    state and commands issued at the wrong time are rejected without any
//!    partial mutation.
//!
//! 2. **Nothing crashes the session** - Malformed frames and protocol
//!    violations are logged and dropped; only transport loss ends a session.
//!
//! 3. **No networking** - The socket is a [`Transport`] supplied by the host;
//!    its callbacks are fed in as [`ConnectionEvent`]s.
//!
//! 4. **Serialization-ready** - State and notices serialize to JSON.
//!
//! # Example
//!
//! ```rust
//! use wordmatch_session::{
//!     testing::MemoryTransport, ConnectionEvent, MatchmakingStatus, RoundState, Session,
//!     SessionConfig,
//! };
//!
//! let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
//! session.open().unwrap();
//! session.handle_event(ConnectionEvent::Opened).unwrap();
//! session.handle_event(ConnectionEvent::Message(
//!     r#"{"type":"CONNECT_RESPONSE","sessionId":"abc"}"#.to_string(),
//! )).unwrap();
//!
//! session.set_nickname("bob").unwrap();
//! session.handle_event(ConnectionEvent::Message(
//!     r#"{"type":"SET_NICKNAME_RESPONSE"}"#.to_string(),
//! )).unwrap();
//!
//! session.join_game().unwrap();
//! session.handle_event(ConnectionEvent::Message(
//!     r#"{"type":"BROADCAST_WORD","word":"PUZZLE","opponentNickname":"alice"}"#.to_string(),
//! )).unwrap();
//!
//! assert_eq!(session.state().matchmaking_status(), MatchmakingStatus::Matched);
//! assert_eq!(session.state().round(), RoundState::AwaitingWord);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
