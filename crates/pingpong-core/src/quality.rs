//! Connection quality classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection quality tier, derived from the last measured round trip.
///
/// `Disconnected` is never produced by classification; it is set explicitly
/// by the session whenever the connection is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Poor,
    Disconnected,
}

impl ConnectionQuality {
    /// Classify a measured round-trip latency (ms).
    ///
    /// Boundaries are inclusive on the better tier: 500 ms is still
    /// `Excellent`, 1000 ms is still `Good`.
    pub fn classify(latency_ms: i64) -> Self {
        if latency_ms > 1000 {
            Self::Poor
        } else if latency_ms > 500 {
            Self::Good
        } else {
            Self::Excellent
        }
    }
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Poor => "poor",
            Self::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}
