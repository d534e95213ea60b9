//! Session state machine.
//!
//! Validates every inbound message and caller command against the current
//! [`SessionState`] and applies it, or rejects it without touching anything.
//!
//! # State Diagram
//!
//! ```text
//! Disconnected ──open──▶ Connecting ──opened──▶ Connected
//!                                                   │ CONNECT_RESPONSE
//!                                                   ▼
//!   nickname:    Unset ──set_nickname──▶ Pending ──SET_NICKNAME_RESPONSE──▶ Confirmed
//!                                                                              │
//!   matchmaking: Idle ──join_game──▶ Waiting ──BROADCAST_WORD──▶ Matched ◀─────┘
//!                 ▲                                                 │
//!                 └──────────────── TERMINATE_GAME ─────────────────┘
//!
//!   round:  None ──BROADCAST_WORD──▶ AwaitingWord ◀──WORD_MISMATCH── WordSubmitted
//!                                        │  ▲                             ▲
//!                                        │  └── BROADCAST_WORD ──┐        │
//!                                        └──────submit_word──────┼────────┘
//!                                                                │
//!                            WordSubmitted ──ROUND_WON/LOST──▶ Resolved
//! ```
//!
//! The player joins the queue once. After a round is won or lost the pairing
//! stays `Matched` and the server opens the next round with another
//! `BROADCAST_WORD`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::connection::{ConnectionPhase, Outbox, SessionEnd};
use super::error::{CommandRejected, ProtocolViolation, Result};
use super::protocol::{ClientMessage, ServerMessage};
use super::round::{RoundOutcome, RoundState};
use super::session::{MatchmakingStatus, NicknameStatus, SessionId, SessionState};

/// A command sent to the server whose answer has not arrived yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PendingCommand {
    Nickname,
    Matchmaking,
    Word,
}

/// Something the caller may want to react to (sound cue, UI refresh).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionNotice {
    Connected,
    SessionAssigned { session_id: SessionId },
    NicknameRequested { nickname: String },
    NicknameConfirmed { nickname: String },
    JoinedQueue,
    OpponentFound { opponent: String, word: String },
    WordSent { word: String },
    WordMismatch,
    RoundWon { details: Map<String, Value> },
    RoundLost { details: Map<String, Value> },
    GameOver,
    ConnectionLost { end: SessionEnd },
}

/// Sole owner of [`SessionState`].
#[derive(Debug, Clone, Default)]
pub struct SessionMachine {
    state: SessionState,
    command_timeout: Option<Duration>,
    matchmaking_timeout: Option<Duration>,
}

impl SessionMachine {
    /// Machine without stall detection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &SessionConfig) -> Self {
        Self {
            state: SessionState::new(),
            command_timeout: config.command_timeout(),
            matchmaking_timeout: config.matchmaking_timeout(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    // Connection lifecycle

    /// Connection attempt started.
    pub fn on_connecting(&mut self) {
        if self.state.connection_phase == ConnectionPhase::Disconnected && !self.state.is_ended() {
            self.state.connection_phase = ConnectionPhase::Connecting;
        }
    }

    /// Socket opened. Repeats are ignored.
    pub fn on_open(&mut self) -> Option<SessionNotice> {
        if self.state.connection_phase != ConnectionPhase::Connecting {
            return None;
        }
        self.state.connection_phase = ConnectionPhase::Connected;
        Some(SessionNotice::Connected)
    }

    /// Socket closed or failed. The session is over for good.
    pub fn on_end(&mut self, end: SessionEnd) -> Option<SessionNotice> {
        if self.state.is_ended() {
            return None;
        }
        self.state.connection_phase = ConnectionPhase::Disconnected;
        self.state.pending = None;
        self.state.ended = Some(end.clone());
        Some(SessionNotice::ConnectionLost { end })
    }

    // Inbound

    /// Apply one server message, or reject it leaving state untouched.
    pub fn dispatch(&mut self, message: ServerMessage) -> Result<Vec<SessionNotice>, ProtocolViolation> {
        let kind = message.kind();
        match self.apply(message) {
            Ok(notices) => {
                debug!(kind, "applied message");
                Ok(notices)
            }
            Err(violation) => {
                warn!(kind, %violation, "protocol violation, message discarded");
                Err(violation)
            }
        }
    }

    fn apply(&mut self, message: ServerMessage) -> Result<Vec<SessionNotice>, ProtocolViolation> {
        let kind = message.kind();
        let state = &mut self.state;

        if state.is_ended() && !matches!(message, ServerMessage::TerminateGame) {
            return Err(ProtocolViolation::SessionEnded);
        }

        match message {
            ServerMessage::ConnectResponse { session_id } => {
                if !state.connection_phase.is_connected() {
                    return Err(ProtocolViolation::NotConnected {
                        kind,
                        phase: state.connection_phase,
                    });
                }
                if state.session_id.is_some() {
                    return Err(ProtocolViolation::SessionIdAlreadySet);
                }
                info!(%session_id, "session assigned");
                state.session_id = Some(session_id.clone());
                Ok(vec![SessionNotice::SessionAssigned { session_id }])
            }

            ServerMessage::SetNicknameResponse => {
                if state.nickname_status != NicknameStatus::Pending {
                    return Err(ProtocolViolation::NicknameNotPending {
                        kind,
                        status: state.nickname_status,
                    });
                }
                state.nickname_status = NicknameStatus::Confirmed;
                state.pending = None;
                Ok(vec![SessionNotice::NicknameConfirmed {
                    nickname: state.nickname.clone(),
                }])
            }

            ServerMessage::BroadcastWord {
                word,
                opponent_nickname,
            } => {
                let next_round = state.matchmaking_status == MatchmakingStatus::Matched
                    && state.round.is_closed();
                if state.matchmaking_status != MatchmakingStatus::Waiting && !next_round {
                    return Err(ProtocolViolation::NotWaitingForMatch {
                        kind,
                        status: state.matchmaking_status,
                    });
                }
                state.matchmaking_status = MatchmakingStatus::Matched;
                state.current_word = Some(word.clone());
                state.opponent_nickname = Some(opponent_nickname.clone());
                state.round = RoundState::AwaitingWord;
                state.last_outcome = None;
                state.pending = None;
                Ok(vec![SessionNotice::OpponentFound {
                    opponent: opponent_nickname,
                    word,
                }])
            }

            ServerMessage::TypeWordResponse { outcome, details } => {
                if state.round != RoundState::WordSubmitted {
                    return Err(ProtocolViolation::NoWordSubmitted {
                        kind,
                        round: state.round,
                    });
                }
                state.round = RoundState::resolve(outcome);
                state.last_outcome = Some(outcome);
                state.pending = None;
                if outcome.closes_round() {
                    info!(outcome = outcome.as_str(), "round closed");
                }
                let notice = match outcome {
                    RoundOutcome::Mismatch => SessionNotice::WordMismatch,
                    RoundOutcome::Won => SessionNotice::RoundWon { details },
                    RoundOutcome::Lost => SessionNotice::RoundLost { details },
                };
                Ok(vec![notice])
            }

            ServerMessage::TerminateGame => {
                state.reset_match();
                info!("game terminated by server");
                Ok(vec![SessionNotice::GameOver])
            }

            ServerMessage::Unrecognized(kind) => Err(ProtocolViolation::Unrecognized(kind)),
        }
    }

    // Commands

    fn ensure_live(&self) -> Result<(), CommandRejected> {
        if self.state.is_ended() {
            return Err(CommandRejected::SessionEnded);
        }
        if !self.state.connection_phase.is_connected() {
            return Err(CommandRejected::NotConnected(self.state.connection_phase));
        }
        Ok(())
    }

    /// Ask the server to register a nickname.
    ///
    /// Only allowed once: while the request is pending or after it was
    /// confirmed the call is rejected and nothing is sent.
    pub fn set_nickname(&mut self, name: &str, outbox: &mut impl Outbox) -> Result<SessionNotice> {
        self.ensure_live()?;
        if self.state.nickname_status != NicknameStatus::Unset {
            return Err(CommandRejected::NicknameNotUnset(self.state.nickname_status).into());
        }
        let nickname = name.trim();
        if nickname.is_empty() {
            return Err(CommandRejected::EmptyNickname.into());
        }

        outbox.transmit(&ClientMessage::SetNickname {
            nickname: nickname.to_string(),
        })?;

        self.state.nickname = nickname.to_string();
        self.state.nickname_status = NicknameStatus::Pending;
        self.state.pending = Some((PendingCommand::Nickname, Utc::now()));
        Ok(SessionNotice::NicknameRequested {
            nickname: nickname.to_string(),
        })
    }

    /// Enter the matchmaking queue.
    pub fn join_game(&mut self, outbox: &mut impl Outbox) -> Result<SessionNotice> {
        self.ensure_live()?;
        if self.state.nickname_status != NicknameStatus::Confirmed {
            return Err(CommandRejected::NicknameNotConfirmed(self.state.nickname_status).into());
        }
        if self.state.matchmaking_status != MatchmakingStatus::Idle {
            return Err(CommandRejected::MatchmakingNotIdle(self.state.matchmaking_status).into());
        }

        outbox.transmit(&ClientMessage::JoinGame)?;

        self.state.matchmaking_status = MatchmakingStatus::Waiting;
        self.state.pending = Some((PendingCommand::Matchmaking, Utc::now()));
        Ok(SessionNotice::JoinedQueue)
    }

    /// Submit a word for the open round.
    pub fn submit_word(&mut self, word: &str, outbox: &mut impl Outbox) -> Result<SessionNotice> {
        self.ensure_live()?;
        if !self.state.round.accepts_word() {
            return Err(CommandRejected::RoundNotAwaitingWord(self.state.round).into());
        }
        if word.is_empty() {
            return Err(CommandRejected::EmptyWord.into());
        }

        outbox.transmit(&ClientMessage::TypeWord {
            word: word.to_string(),
        })?;

        self.state.round = RoundState::WordSubmitted;
        self.state.pending = Some((PendingCommand::Word, Utc::now()));
        Ok(SessionNotice::WordSent {
            word: word.to_string(),
        })
    }

    // Stall detection

    /// Outstanding command that has waited longer than its timeout.
    ///
    /// Pure query; nothing is retried or reset.
    pub fn stalled(&self, now: DateTime<Utc>) -> Option<PendingCommand> {
        let (command, since) = self.state.pending?;
        let timeout = match command {
            PendingCommand::Matchmaking => self.matchmaking_timeout,
            PendingCommand::Nickname | PendingCommand::Word => self.command_timeout,
        }?;
        let waited = (now - since).to_std().ok()?;
        (waited > timeout).then_some(command)
    }
}
