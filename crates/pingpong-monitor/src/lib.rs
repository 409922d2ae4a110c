//! Heartbeat monitor application.
//!
//! Wires a `HeartbeatSession` to structured logging so connection status
//! and ping/pong statistics are visible on the console.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, HeartbeatConfig};
pub use error::{AppError, AppResult};
pub use logging::init_logging;
