//! In-memory transport for tests and offline hosts.

use super::connection::Transport;
use super::error::{Result, SessionError};

/// Transport that records frames instead of touching the network.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    connect_requested: bool,
    closed: bool,
    sent: Vec<String>,
    connect_error: Option<String>,
    send_error: Option<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `connect` call fail.
    pub fn fail_connect(&mut self, error: impl Into<String>) {
        self.connect_error = Some(error.into());
    }

    /// Make every subsequent `send_text` call fail.
    pub fn fail_sends(&mut self, error: impl Into<String>) {
        self.send_error = Some(error.into());
    }

    pub fn is_connect_requested(&self) -> bool {
        self.connect_requested
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Frames sent so far, oldest first.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Sent frames parsed back into JSON values.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .filter_map(|frame| serde_json::from_str(frame).ok())
            .collect()
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self) -> Result<()> {
        if let Some(error) = self.connect_error.take() {
            return Err(SessionError::Transport(error));
        }
        self.connect_requested = true;
        Ok(())
    }

    fn send_text(&mut self, frame: String) -> Result<()> {
        if let Some(error) = &self.send_error {
            return Err(SessionError::Transport(error.clone()));
        }
        self.sent.push(frame);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
