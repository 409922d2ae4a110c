//! Heartbeat session engine for chat clients.
//!
//! Provides robust liveness probing over a persistent WebSocket:
//! - Periodic application-level ping with a bounded pong deadline
//! - Round-trip latency measurement and quality classification
//! - Automatic reconnection with bounded exponential backoff
//! - Multicast status/stats observers fed with read-only snapshots

pub mod config;
pub mod error;
pub mod heartbeat;
pub mod observer;
pub mod session;

pub use config::{SessionConfig, UserIdentity};
pub use error::{SessionError, SessionResult};
pub use heartbeat::HeartbeatClock;
pub use observer::ObserverRegistry;
pub use session::{HeartbeatSession, SessionState};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
