//! Score history request descriptor.
//!
//! Past results live behind a separate HTTP gateway, keyed by session id.
//! This module only describes the request; performing it is up to the host.

use serde::Serialize;

use super::error::{Result, SessionError};
use super::session::{SessionId, SessionState};

/// `GET {gateway}/scores/{sessionId}?afterIndex={n}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRequest {
    pub session_id: SessionId,
    /// Pagination cursor; results after this index are returned.
    pub after_index: u64,
}

impl ScoreRequest {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            after_index: 0,
        }
    }

    /// Build a request for the session's own history.
    pub fn for_session(state: &SessionState) -> Result<Self> {
        state
            .session_id()
            .cloned()
            .map(Self::new)
            .ok_or(SessionError::NoSession)
    }

    #[must_use]
    pub fn after(mut self, index: u64) -> Self {
        self.after_index = index;
        self
    }

    pub fn path(&self) -> String {
        format!("/scores/{}?afterIndex={}", self.session_id, self.after_index)
    }

    /// Full URL under the gateway root. A trailing slash on the root is tolerated.
    pub fn url(&self, gateway_root: &str) -> String {
        format!("{}{}", gateway_root.trim_end_matches('/'), self.path())
    }
}
