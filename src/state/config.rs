//! Session configuration.

use std::time::Duration;

use serde::Deserialize;

use super::error::ConfigError;

/// Default time to wait for a nickname or word answer (10 seconds).
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;

/// Default time to wait for an opponent (2 minutes).
pub const DEFAULT_MATCHMAKING_TIMEOUT_SECS: u64 = 120;

/// Settings for one client session.
///
/// Loadable from JSON; every field except `server_url` has a default.
///
/// ```
/// use wordmatch_session::SessionConfig;
///
/// let config = SessionConfig::from_json_str(r#"{"server_url": "wss://play.example/ws"}"#).unwrap();
/// assert_eq!(config.command_timeout_secs, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Game socket endpoint.
    pub server_url: String,
    /// Root URL of the HTTP gateway serving score history.
    #[serde(default)]
    pub gateway_root_url: String,
    /// How long a nickname or word command may wait for its answer.
    /// Zero disables stall detection. Default: 10.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    /// How long to wait for an opponent after joining. Zero disables.
    /// Default: 120.
    #[serde(default = "default_matchmaking_timeout")]
    pub matchmaking_timeout_secs: u64,
}

fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_matchmaking_timeout() -> u64 {
    DEFAULT_MATCHMAKING_TIMEOUT_SECS
}

impl SessionConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            gateway_root_url: String::new(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            matchmaking_timeout_secs: DEFAULT_MATCHMAKING_TIMEOUT_SECS,
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_gateway_root_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_root_url = url.into();
        self
    }

    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_secs = timeout.as_secs();
        self
    }

    #[must_use]
    pub fn with_matchmaking_timeout(mut self, timeout: Duration) -> Self {
        self.matchmaking_timeout_secs = timeout.as_secs();
        self
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        non_zero(self.command_timeout_secs)
    }

    pub fn matchmaking_timeout(&self) -> Option<Duration> {
        non_zero(self.matchmaking_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "server_url must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("ws://localhost:8080/ws")
    }
}

fn non_zero(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
