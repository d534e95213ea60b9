//! Error types for the session controller.
//!
//! Failures fall into four buckets. Transport failures end the session.
//! Malformed frames ([`DecodeError`]) and protocol violations
//! ([`ProtocolViolation`]) are logged and discarded. Rejected commands
//! ([`CommandRejected`]) send nothing and change nothing.

use super::round::RoundState;
use super::session::{MatchmakingStatus, NicknameStatus};
use super::ConnectionPhase;

/// Result alias used throughout the crate.
pub type Result<T, E = SessionError> = std::result::Result<T, E>;

/// Top-level error for fallible session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connection is not open (phase: {phase})")]
    NotConnected { phase: ConnectionPhase },

    #[error("session has ended")]
    Ended,

    #[error("no session id assigned yet")]
    NoSession,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("failed to encode outbound message")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    #[error(transparent)]
    Rejected(#[from] CommandRejected),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// An inbound frame that could not be turned into a [`ServerMessage`].
///
/// [`ServerMessage`]: super::protocol::ServerMessage
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON")]
    Json(#[source] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame has no string `type` discriminator")]
    MissingType,

    #[error("invalid fields for {kind}")]
    InvalidFields {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown game message type {0:?}")]
    UnknownGameMessageType(String),
}

/// A well-formed message that arrived when the session state forbids it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("{kind} received while connection is {phase}")]
    NotConnected {
        kind: &'static str,
        phase: ConnectionPhase,
    },

    #[error("session id already assigned")]
    SessionIdAlreadySet,

    #[error("{kind} received while nickname is {status:?}")]
    NicknameNotPending {
        kind: &'static str,
        status: NicknameStatus,
    },

    #[error("{kind} received while matchmaking is {status:?}")]
    NotWaitingForMatch {
        kind: &'static str,
        status: MatchmakingStatus,
    },

    #[error("{kind} received while round is {round:?}")]
    NoWordSubmitted {
        kind: &'static str,
        round: RoundState,
    },

    #[error("unrecognized message type {0:?}")]
    Unrecognized(String),

    #[error("session has ended")]
    SessionEnded,
}

/// Why a caller command was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandRejected {
    #[error("connection is {0}")]
    NotConnected(ConnectionPhase),

    #[error("session has ended")]
    SessionEnded,

    #[error("nickname is empty")]
    EmptyNickname,

    #[error("nickname is already {0:?}")]
    NicknameNotUnset(NicknameStatus),

    #[error("nickname must be confirmed first (currently {0:?})")]
    NicknameNotConfirmed(NicknameStatus),

    #[error("matchmaking is already {0:?}")]
    MatchmakingNotIdle(MatchmakingStatus),

    #[error("word is empty")]
    EmptyWord,

    #[error("round is not awaiting a word (currently {0:?})")]
    RoundNotAwaitingWord(RoundState),
}

/// Configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error("failed to parse configuration")]
    Parse(#[source] serde_json::Error),
}
