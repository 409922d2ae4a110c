//! Core domain types for the heartbeat liveness client.
//!
//! This crate provides the pure data model shared across the workspace:
//! - `PingMessage` / `PongMessage`: JSON wire records and frame parsing
//! - `ConnectionQuality`: latency tier classification
//! - `ConnectionStatus`: observable connection snapshot
//! - `StatsAccumulator` / `PingPongStats`: monotonic ping/pong statistics
//!
//! No I/O or async code lives here; the session engine drives these types.

pub mod error;
pub mod message;
pub mod quality;
pub mod session_id;
pub mod stats;
pub mod status;

pub use error::{CoreError, Result};
pub use message::{parse_frame, Frame, PingMessage, PongMessage};
pub use quality::ConnectionQuality;
pub use stats::{PingPongStats, StatsAccumulator};
pub use status::ConnectionStatus;

/// Current wall-clock time as Unix epoch milliseconds.
///
/// All wire timestamps and activity stamps use this scale, matching the
/// server's `timestamp` echo convention.
pub fn epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
