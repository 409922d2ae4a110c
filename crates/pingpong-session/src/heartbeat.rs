//! Per-connection ping/pong bookkeeping.

use std::time::Duration;
use tokio::time::Instant;

/// Tracks the in-flight pong deadline and the last ping/pong stamps for one
/// transport connection.
///
/// There is at most one armed deadline: `record_ping` replaces any previous
/// one, `record_pong` clears it. The session loop turns the armed deadline
/// into a `sleep_until` branch of its `select!`, so deadline expiry and pong
/// arrival can never race.
#[derive(Debug)]
pub struct HeartbeatClock {
    pong_timeout: Duration,
    last_ping_ms: Option<i64>,
    last_pong_ms: Option<i64>,
    deadline: Option<Instant>,
}

impl HeartbeatClock {
    pub fn new(pong_timeout: Duration) -> Self {
        Self {
            pong_timeout,
            last_ping_ms: None,
            last_pong_ms: None,
            deadline: None,
        }
    }

    /// Record a ping send and arm the pong deadline, replacing any armed one.
    pub fn record_ping(&mut self, now_ms: i64) {
        self.last_ping_ms = Some(now_ms);
        self.deadline = Some(Instant::now() + self.pong_timeout);
    }

    /// Record a pong receipt and disarm the deadline.
    pub fn record_pong(&mut self, now_ms: i64) {
        self.last_pong_ms = Some(now_ms);
        self.deadline = None;
    }

    /// The armed pong deadline, if a pong is outstanding.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn waiting_for_pong(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn last_ping_ms(&self) -> Option<i64> {
        self.last_ping_ms
    }

    pub fn last_pong_ms(&self) -> Option<i64> {
        self.last_pong_ms
    }
}
