//! Application configuration.

use crate::error::{AppError, AppResult};
use pingpong_session::{SessionConfig, UserIdentity};
use serde::{Deserialize, Serialize};

/// Heartbeat tuning subset, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Ping send interval (ms).
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    /// Pong deadline after each ping (ms).
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,
    /// Maximum failure-triggered retries before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Base delay for reconnection backoff (ms).
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

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: default_ping_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

impl From<HeartbeatConfig> for SessionConfig {
    fn from(cfg: HeartbeatConfig) -> Self {
        Self {
            endpoint: String::new(), // Set separately
            ping_interval_ms: cfg.ping_interval_ms,
            pong_timeout_ms: cfg.pong_timeout_ms,
            max_reconnect_attempts: cfg.max_reconnect_attempts,
            reconnect_base_delay_ms: cfg.reconnect_base_delay_ms,
            reconnect_max_delay_ms: cfg.reconnect_max_delay_ms,
        }
    }
}

/// Monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// WebSocket endpoint of the heartbeat gateway.
    pub endpoint: String,
    /// User the heartbeat belongs to.
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Full session config with the endpoint filled in.
    pub fn session_config(&self) -> SessionConfig {
        let mut config: SessionConfig = self.heartbeat.clone().into();
        config.endpoint = self.endpoint.clone();
        config
    }

    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(self.user_id.clone(), self.username.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            endpoint = "ws://localhost:9001"
            user_id = "u1"
            username = "n1"
            "#,
        )
        .unwrap();

        assert_eq!(config.heartbeat.ping_interval_ms, 30_000);
        assert_eq!(config.heartbeat.pong_timeout_ms, 10_000);
        assert_eq!(config.heartbeat.max_reconnect_attempts, 5);
    }

    #[test]
    fn test_session_config_carries_endpoint() {
        let config: AppConfig = toml::from_str(
            r#"
            endpoint = "ws://localhost:9001"
            user_id = "u1"
            username = "n1"

            [heartbeat]
            ping_interval_ms = 5000
            "#,
        )
        .unwrap();

        let session = config.session_config();
        assert_eq!(session.endpoint, "ws://localhost:9001");
        assert_eq!(session.ping_interval_ms, 5_000);
        assert_eq!(session.pong_timeout_ms, 10_000);
    }

    #[test]
    fn test_identity() {
        let config: AppConfig = toml::from_str(
            r#"
            endpoint = "ws://localhost:9001"
            user_id = "u1"
            username = "n1"
            "#,
        )
        .unwrap();

        let identity = config.identity();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.username, "n1");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = AppConfig::from_file("does/not/exist.toml");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
