//! Wire protocol: message vocabulary and JSON codec.
//!
//! Every frame, in either direction, is a flat JSON object carrying a string
//! `type` discriminator plus type-specific fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{DecodeError, Result, SessionError};
use super::round::RoundOutcome;
use super::session::SessionId;

/// Discriminator field present on every frame.
pub const TYPE_FIELD: &str = "type";

// Outbound (client -> server)
pub const SET_NICKNAME: &str = "SET_NICKNAME";
pub const JOIN_GAME: &str = "JOIN_GAME";
pub const TYPE_WORD: &str = "TYPE_WORD";

// Inbound (server -> client)
pub const CONNECT_RESPONSE: &str = "CONNECT_RESPONSE";
pub const SET_NICKNAME_RESPONSE: &str = "SET_NICKNAME_RESPONSE";
pub const BROADCAST_WORD: &str = "BROADCAST_WORD";
pub const TYPE_WORD_RESPONSE: &str = "TYPE_WORD_RESPONSE";
pub const TERMINATE_GAME: &str = "TERMINATE_GAME";

// `gameMessageType` values carried by TYPE_WORD_RESPONSE
pub const WORD_MISMATCH: &str = "WORD_MISMATCH";
pub const ROUND_WON: &str = "ROUND_WON";
pub const ROUND_LOST: &str = "ROUND_LOST";

/// Commands sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    SetNickname { nickname: String },
    JoinGame,
    TypeWord { word: String },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetNickname { .. } => SET_NICKNAME,
            Self::JoinGame => JOIN_GAME,
            Self::TypeWord { .. } => TYPE_WORD,
        }
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(SessionError::Encode)
    }
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    ConnectResponse {
        session_id: SessionId,
    },
    SetNicknameResponse,
    BroadcastWord {
        word: String,
        opponent_nickname: String,
    },
    TypeWordResponse {
        outcome: RoundOutcome,
        /// Any fields besides the outcome code, passed through untouched.
        details: Map<String, Value>,
    },
    TerminateGame,
    /// Well-formed frame with a discriminator this client does not know.
    Unrecognized(String),
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectResponse { .. } => CONNECT_RESPONSE,
            Self::SetNicknameResponse => SET_NICKNAME_RESPONSE,
            Self::BroadcastWord { .. } => BROADCAST_WORD,
            Self::TypeWordResponse { .. } => TYPE_WORD_RESPONSE,
            Self::TerminateGame => TERMINATE_GAME,
            Self::Unrecognized(_) => "UNRECOGNIZED",
        }
    }

    /// Decode a JSON text frame.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(raw).map_err(DecodeError::Json)?;
        let Value::Object(mut fields) = value else {
            return Err(DecodeError::NotAnObject);
        };
        let kind = match fields.remove(TYPE_FIELD) {
            Some(Value::String(kind)) => kind,
            _ => return Err(DecodeError::MissingType),
        };
        let body = Value::Object(fields);

        match kind.as_str() {
            CONNECT_RESPONSE => {
                let body: ConnectBody = parse_body(&kind, body)?;
                Ok(Self::ConnectResponse {
                    session_id: body.session_id,
                })
            }
            SET_NICKNAME_RESPONSE => Ok(Self::SetNicknameResponse),
            BROADCAST_WORD => {
                let body: BroadcastBody = parse_body(&kind, body)?;
                Ok(Self::BroadcastWord {
                    word: body.word,
                    opponent_nickname: body.opponent_nickname,
                })
            }
            TYPE_WORD_RESPONSE => {
                let body: TypeWordBody = parse_body(&kind, body)?;
                let outcome = RoundOutcome::from_wire(&body.game_message_type)
                    .ok_or(DecodeError::UnknownGameMessageType(body.game_message_type))?;
                Ok(Self::TypeWordResponse {
                    outcome,
                    details: body.details,
                })
            }
            TERMINATE_GAME => Ok(Self::TerminateGame),
            _ => Ok(Self::Unrecognized(kind)),
        }
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(kind: &str, body: Value) -> Result<T, DecodeError> {
    serde_json::from_value(body).map_err(|source| DecodeError::InvalidFields {
        kind: kind.to_string(),
        source,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectBody {
    session_id: SessionId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastBody {
    word: String,
    opponent_nickname: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeWordBody {
    game_message_type: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}
