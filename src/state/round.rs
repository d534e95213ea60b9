//! Round state.
//!
//! A round opens when the server broadcasts a word to a matched pair and
//! closes when one of the players wins it. The next broadcast opens the
//! following round for the same pair.
//!
//! ```text
//! None ──broadcast──▶ AwaitingWord ──submit──▶ WordSubmitted
//!                       ▲    ▲                      │
//!                       │    └─────── mismatch ─────┤
//!             broadcast │                           │ won / lost
//!                       │                           ▼
//!                       └──────────────── Resolved(Won | Lost)
//! ```

use serde::Serialize;

use super::protocol::{ROUND_LOST, ROUND_WON, WORD_MISMATCH};

/// Result code carried by a TYPE_WORD_RESPONSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RoundOutcome {
    /// Submitted word did not match; the round stays open.
    Mismatch,
    Won,
    Lost,
}

impl RoundOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mismatch => WORD_MISMATCH,
            Self::Won => ROUND_WON,
            Self::Lost => ROUND_LOST,
        }
    }

    pub fn from_wire(code: &str) -> Option<Self> {
        match code {
            WORD_MISMATCH => Some(Self::Mismatch),
            ROUND_WON => Some(Self::Won),
            ROUND_LOST => Some(Self::Lost),
            _ => None,
        }
    }

    /// Check if this outcome ends the round.
    pub fn closes_round(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Where the current round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RoundState {
    #[default]
    None,
    AwaitingWord,
    WordSubmitted,
    Resolved(RoundOutcome),
}

impl RoundState {
    /// Check if the player may submit a word.
    pub fn accepts_word(&self) -> bool {
        matches!(self, Self::AwaitingWord)
    }

    /// Check if the round has been won or lost.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Resolved(outcome) if outcome.closes_round())
    }

    /// State after the server answers a submitted word.
    ///
    /// A mismatch discards the submitted word and reopens input.
    pub fn resolve(outcome: RoundOutcome) -> Self {
        match outcome {
            RoundOutcome::Mismatch => Self::AwaitingWord,
            closed => Self::Resolved(closed),
        }
    }
}
