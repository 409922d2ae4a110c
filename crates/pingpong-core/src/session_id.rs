//! Session id generation.

use uuid::Uuid;

/// Generate an opaque session token, unique per connection attempt.
///
/// Format: `session_<epoch_ms>_<random>`, matching what the server expects
/// in the connect URL and ping correlation.
pub fn generate(now_ms: i64) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", now_ms, &random[..9])
}
