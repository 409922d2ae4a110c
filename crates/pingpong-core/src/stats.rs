//! Ping/pong statistics accumulation.

use serde::{Deserialize, Serialize};

/// Statistics snapshot published to stats observers after every ping send
/// and pong receipt. Always a copy; observers cannot touch accumulator
/// state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PingPongStats {
    /// Total pings sent over the session's lifetime.
    pub total_pings: u64,
    /// Total pongs received over the session's lifetime.
    pub total_pongs: u64,
    /// Running mean of round-trip latency samples (ms).
    pub average_latency_ms: f64,
    /// Time since the last successful transport open (ms). Zero when the
    /// session has never connected or was explicitly disconnected.
    pub connection_uptime_ms: i64,
    /// Most recent ping send or pong receipt (Unix epoch ms).
    pub last_activity_ms: i64,
}

/// Mutable accumulator behind the snapshots.
///
/// Counters are monotonic for the life of a session. Reconnects within the
/// same session keep accumulating; only a fresh driver start resets them.
/// Uptime is recomputed on demand from the connection start stamp, not
/// ticked by a timer.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    total_pings: u64,
    total_pongs: u64,
    average_latency_ms: f64,
    connection_start_ms: Option<i64>,
    last_activity_ms: i64,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the connection start. Called on every successful open.
    pub fn mark_connected(&mut self, now_ms: i64) {
        self.connection_start_ms = Some(now_ms);
    }

    /// Clear the connection start stamp. Called on explicit disconnect, so
    /// uptime reads zero afterwards.
    pub fn mark_idle(&mut self) {
        self.connection_start_ms = None;
    }

    /// Record a ping send.
    pub fn record_ping(&mut self, now_ms: i64) {
        self.total_pings += 1;
        self.last_activity_ms = now_ms;
    }

    /// Record a pong receipt with its locally measured latency sample.
    ///
    /// The running mean update is `avg' = (avg*(n-1) + sample)/n` with
    /// `n = total_pongs` after the increment.
    pub fn record_pong(&mut self, now_ms: i64, latency_sample_ms: i64) {
        self.total_pongs += 1;
        self.last_activity_ms = now_ms;

        let n = self.total_pongs as f64;
        self.average_latency_ms =
            (self.average_latency_ms * (n - 1.0) + latency_sample_ms as f64) / n;
    }

    /// Produce a snapshot at the given time.
    pub fn snapshot(&self, now_ms: i64) -> PingPongStats {
        PingPongStats {
            total_pings: self.total_pings,
            total_pongs: self.total_pongs,
            average_latency_ms: self.average_latency_ms,
            connection_uptime_ms: self
                .connection_start_ms
                .map(|start| now_ms.saturating_sub(start))
                .unwrap_or(0),
            last_activity_ms: self.last_activity_ms,
        }
    }
}
