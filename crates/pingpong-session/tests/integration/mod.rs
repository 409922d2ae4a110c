//! Integration test support for pingpong-session.
//!
//! Exercises the session engine against a real in-process WebSocket server
//! rather than mocked traits, so framing, close codes and reconnects are
//! tested end to end.

pub mod common;
