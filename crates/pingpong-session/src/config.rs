//! Session configuration.

use crate::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Identity carried in the connect URL and in every outgoing ping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub username: String,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
        }
    }
}

/// Heartbeat session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// WebSocket endpoint (base URL, query parameters appended at connect).
    pub endpoint: String,
    /// Ping send interval (ms).
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    /// Pong must arrive within this after a ping (ms).
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,
    /// Maximum failure-triggered retries before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff (ms).
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Cap on the backoff delay (ms).
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_ping_interval_ms() -> u64 {
    30_000
}

fn default_pong_timeout_ms() -> u64 {
    10_000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_base_delay_ms() -> u64 {
    1_000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            ping_interval_ms: default_ping_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

impl SessionConfig {
    /// Config with defaults for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Check the endpoint parses as a URL.
    pub fn validate_endpoint(&self) -> SessionResult<()> {
        Url::parse(&self.endpoint)
            .map(|_| ())
            .map_err(|e| SessionError::InvalidEndpoint(e.to_string()))
    }

    /// Build the connect URL with `userId`, `username` and `sessionId`
    /// query parameters. Encoding is handled by the `url` crate.
    pub fn connect_url(&self, identity: &UserIdentity, session_id: &str) -> SessionResult<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| SessionError::InvalidEndpoint(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("userId", &identity.user_id)
            .append_pair("username", &identity.username)
            .append_pair("sessionId", session_id);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.ping_interval_ms, 30_000);
        assert_eq!(config.pong_timeout_ms, 10_000);
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.reconnect_base_delay_ms, 1_000);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"endpoint":"ws://localhost:9001","pong_timeout_ms":500}"#)
                .unwrap();
        assert_eq!(config.endpoint, "ws://localhost:9001");
        assert_eq!(config.pong_timeout_ms, 500);
        assert_eq!(config.ping_interval_ms, 30_000);
    }

    #[test]
    fn test_connect_url_query_params() {
        let config = SessionConfig::new("wss://gateway.example.com/live");
        let identity = UserIdentity::new("u1", "n1");
        let url = config.connect_url(&identity, "session_1_abc").unwrap();

        let query = url.query().unwrap();
        assert!(query.contains("userId=u1"));
        assert!(query.contains("username=n1"));
        assert!(query.contains("sessionId=session_1_abc"));
    }

    #[test]
    fn test_connect_url_encodes_username() {
        let config = SessionConfig::new("wss://gateway.example.com/live");
        let identity = UserIdentity::new("u1", "alice smith&co");
        let url = config.connect_url(&identity, "s").unwrap();

        let query = url.query().unwrap();
        assert!(!query.contains(' '));
        assert!(!query.contains("smith&co"));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let config = SessionConfig::new("not a url");
        assert!(config.validate_endpoint().is_err());
        assert!(config
            .connect_url(&UserIdentity::new("u", "n"), "s")
            .is_err());
    }
}
