//! Session state.
//!
//! [`SessionState`] is the single aggregate describing one client session.
//! Only [`SessionMachine`](super::machine::SessionMachine) mutates it; everyone
//! else reads it, usually through the derived projections below.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::connection::{ConnectionPhase, SessionEnd};
use super::machine::PendingCommand;
use super::round::{RoundOutcome, RoundState};

pub const LOADING_CONNECTING: &str = "Connecting to server...";
pub const LOADING_SETTING_NICKNAME: &str = "Setting nickname...";
pub const LOADING_WAITING_FOR_OPPONENT: &str = "Waiting for an opponent...";

/// Server-assigned session identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub enum NicknameStatus {
    #[default]
    Unset,
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MatchmakingStatus {
    #[default]
    Idle,
    Waiting,
    Matched,
}

/// Everything the client knows about its session.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionState {
    /// Socket lifecycle as seen by the machine.
    pub(super) connection_phase: ConnectionPhase,
    /// Assigned by CONNECT_RESPONSE. Write-once.
    pub(super) session_id: Option<SessionId>,
    /// Only moves forward: Unset, Pending, Confirmed.
    pub(super) nickname_status: NicknameStatus,
    /// Requested nickname, trimmed. Empty until the first request.
    pub(super) nickname: String,
    /// Idle until the player joins; stays Matched across rounds.
    pub(super) matchmaking_status: MatchmakingStatus,
    /// State of the current round, `None` before the first broadcast.
    pub(super) round: RoundState,
    /// Set by BROADCAST_WORD; cleared by TERMINATE_GAME.
    pub(super) opponent_nickname: Option<String>,
    /// Word of the current or most recent round.
    pub(super) current_word: Option<String>,
    /// Latest answer to a submitted word, mismatches included.
    pub(super) last_outcome: Option<RoundOutcome>,
    /// Command awaiting a server answer, and when it was sent.
    pub(super) pending: Option<(PendingCommand, DateTime<Utc>)>,
    /// Why the session ended. Once set the session never comes back.
    pub(super) ended: Option<SessionEnd>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_phase(&self) -> ConnectionPhase {
        self.connection_phase
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn nickname_status(&self) -> NicknameStatus {
        self.nickname_status
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn matchmaking_status(&self) -> MatchmakingStatus {
        self.matchmaking_status
    }

    pub fn round(&self) -> RoundState {
        self.round
    }

    pub fn opponent_nickname(&self) -> Option<&str> {
        self.opponent_nickname.as_deref()
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    pub fn last_outcome(&self) -> Option<RoundOutcome> {
        self.last_outcome
    }

    pub fn pending(&self) -> Option<(PendingCommand, DateTime<Utc>)> {
        self.pending
    }

    pub fn ended(&self) -> Option<&SessionEnd> {
        self.ended.as_ref()
    }

    pub fn is_ended(&self) -> bool {
        self.ended.is_some()
    }

    /// Connected and holding a session id.
    pub fn is_joined(&self) -> bool {
        self.connection_phase.is_connected() && self.session_id.is_some()
    }

    /// Put matchmaking and round fields back to their initial values.
    pub(super) fn reset_match(&mut self) {
        self.matchmaking_status = MatchmakingStatus::Idle;
        self.round = RoundState::None;
        self.opponent_nickname = None;
        self.current_word = None;
        self.last_outcome = None;
        if matches!(
            self.pending,
            Some((PendingCommand::Matchmaking | PendingCommand::Word, _))
        ) {
            self.pending = None;
        }
    }

    // Projections

    /// Show the loading banner.
    pub fn awaiting_connection(&self) -> bool {
        !self.connection_phase.is_connected()
            || self.session_id.is_none()
            || self.nickname_status == NicknameStatus::Pending
            || self.matchmaking_status == MatchmakingStatus::Waiting
    }

    pub fn nickname_form_visible(&self) -> bool {
        self.connection_phase.is_connected() && self.nickname_status != NicknameStatus::Confirmed
    }

    pub fn can_set_nickname(&self, pending_nickname: &str) -> bool {
        !pending_nickname.trim().is_empty()
            && self.nickname_status == NicknameStatus::Unset
            && self.connection_phase.is_connected()
    }

    pub fn join_form_visible(&self) -> bool {
        self.nickname_status == NicknameStatus::Confirmed
            && self.matchmaking_status == MatchmakingStatus::Idle
    }

    pub fn tutorial_visible(&self) -> bool {
        self.join_form_visible()
    }

    pub fn game_area_visible(&self) -> bool {
        self.round != RoundState::None
    }

    pub fn can_submit_word(&self, pending_word: &str) -> bool {
        !pending_word.is_empty() && self.round.accepts_word()
    }

    pub fn loading_text(&self) -> Option<&'static str> {
        if !self.connection_phase.is_connected() || self.session_id.is_none() {
            Some(LOADING_CONNECTING)
        } else if self.nickname_status == NicknameStatus::Pending {
            Some(LOADING_SETTING_NICKNAME)
        } else if self.matchmaking_status == MatchmakingStatus::Waiting {
            Some(LOADING_WAITING_FOR_OPPONENT)
        } else {
            None
        }
    }

    /// Snapshot of the view-facing projections.
    pub fn view(&self) -> SessionView {
        SessionView {
            awaiting_connection: self.awaiting_connection(),
            loading_text: self.loading_text(),
            nickname_form_visible: self.nickname_form_visible(),
            join_form_visible: self.join_form_visible(),
            tutorial_visible: self.tutorial_visible(),
            game_area_visible: self.game_area_visible(),
            word_input_enabled: self.round.accepts_word(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Read-only projections for the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub awaiting_connection: bool,
    pub loading_text: Option<&'static str>,
    pub nickname_form_visible: bool,
    pub join_form_visible: bool,
    pub tutorial_visible: bool,
    pub game_area_visible: bool,
    pub word_input_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_initial_state() {
        let state = SessionState::new();
        assert_eq!(state.connection_phase(), ConnectionPhase::Disconnected);
        assert!(state.session_id().is_none());
        assert_eq!(state.nickname_status(), NicknameStatus::Unset);
        assert_eq!(state.matchmaking_status(), MatchmakingStatus::Idle);
        assert_eq!(state.round(), RoundState::None);
        assert!(!state.is_joined());
    }

    #[test]
    fn test_initial_view() {
        let view = SessionState::new().view();
        assert_eq!(
            view,
            SessionView {
                awaiting_connection: true,
                loading_text: Some(LOADING_CONNECTING),
                nickname_form_visible: false,
                join_form_visible: false,
                tutorial_visible: false,
                game_area_visible: false,
                word_input_enabled: false,
            }
        );
    }

    #[test]
    fn test_awaiting_connection_until_session_id() {
        let mut state = SessionState::new();
        state.connection_phase = ConnectionPhase::Connected;
        assert!(state.awaiting_connection());
        assert!(state.nickname_form_visible());

        state.session_id = Some(SessionId::new("s-1"));
        assert!(!state.awaiting_connection());
        assert_eq!(state.loading_text(), None);

        state.nickname_status = NicknameStatus::Pending;
        assert!(state.awaiting_connection());
        assert_eq!(state.loading_text(), Some(LOADING_SETTING_NICKNAME));
    }

    #[test]
    fn test_word_projections() {
        let mut state = SessionState::new();
        assert!(!state.can_submit_word("HELLO"));

        state.round = RoundState::AwaitingWord;
        assert!(state.can_submit_word("HELLO"));
        assert!(!state.can_submit_word(""));
        assert!(state.game_area_visible());
    }

    #[test]
    fn test_reset_match() {
        let mut state = SessionState::new();
        state.nickname_status = NicknameStatus::Confirmed;
        state.matchmaking_status = MatchmakingStatus::Matched;
        state.round = RoundState::WordSubmitted;
        state.opponent_nickname = Some("alice".to_string());
        state.current_word = Some("PUZZLE".to_string());
        state.pending = Some((PendingCommand::Word, Utc::now()));

        state.reset_match();

        assert_eq!(state.matchmaking_status(), MatchmakingStatus::Idle);
        assert_eq!(state.round(), RoundState::None);
        assert_eq!(state.opponent_nickname(), None);
        assert_eq!(state.current_word(), None);
        assert_eq!(state.pending(), None);
        assert_eq!(state.nickname_status(), NicknameStatus::Confirmed);
    }

    #[test]
    fn test_session_id_serializes_as_string() {
        let id = SessionId::new("abc");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("abc"));
        assert_eq!(id.to_string(), "abc");
    }
}
