//! Observable connection status snapshots.

use crate::quality::ConnectionQuality;
use serde::{Deserialize, Serialize};

/// Point-in-time view of the connection, published to status observers on
/// every status-affecting event.
///
/// Invariant: `quality == Disconnected` exactly when `is_connected == false`.
/// The constructors are the only way the session builds these, so the
/// invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub is_connected: bool,
    /// Last ping send time (Unix epoch ms), if any ping was sent.
    pub last_ping_time: Option<i64>,
    /// Last pong receive time (Unix epoch ms), if any pong arrived.
    pub last_pong_time: Option<i64>,
    /// Last measured round-trip latency (ms).
    pub latency_ms: Option<i64>,
    pub quality: ConnectionQuality,
}

impl ConnectionStatus {
    /// Status right after a successful transport open: connected, no
    /// measurements yet, quality optimistically `Excellent`.
    pub fn opened() -> Self {
        Self {
            is_connected: true,
            last_ping_time: None,
            last_pong_time: None,
            latency_ms: None,
            quality: ConnectionQuality::Excellent,
        }
    }

    /// Status after a measured round trip. Quality is classified from the
    /// latency, never `Disconnected`.
    pub fn measured(latency_ms: i64, last_ping_time: Option<i64>, last_pong_time: i64) -> Self {
        Self {
            is_connected: true,
            last_ping_time,
            last_pong_time: Some(last_pong_time),
            latency_ms: Some(latency_ms),
            quality: ConnectionQuality::classify(latency_ms),
        }
    }

    /// Status while the connection is down.
    pub fn disconnected() -> Self {
        Self {
            is_connected: false,
            last_ping_time: None,
            last_pong_time: None,
            latency_ms: None,
            quality: ConnectionQuality::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_invariant() {
        assert_eq!(
            ConnectionStatus::disconnected().quality,
            ConnectionQuality::Disconnected
        );
        assert!(!ConnectionStatus::disconnected().is_connected);

        let opened = ConnectionStatus::opened();
        assert!(opened.is_connected);
        assert_ne!(opened.quality, ConnectionQuality::Disconnected);

        let measured = ConnectionStatus::measured(42, Some(1), 2);
        assert!(measured.is_connected);
        assert_eq!(measured.quality, ConnectionQuality::Excellent);
    }

    #[test]
    fn test_measured_classifies() {
        assert_eq!(
            ConnectionStatus::measured(750, None, 1).quality,
            ConnectionQuality::Good
        );
        assert_eq!(
            ConnectionStatus::measured(2000, None, 1).quality,
            ConnectionQuality::Poor
        );
    }
}
