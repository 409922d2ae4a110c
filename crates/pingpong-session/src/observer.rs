//! Observer registry for status and stats snapshots.
//!
//! Multicast: every registered callback receives every snapshot. Callbacks
//! run synchronously on the session's event loop, so they should be cheap
//! and must not block.

use parking_lot::RwLock;
use pingpong_core::{ConnectionStatus, PingPongStats};

pub type StatusCallback = Box<dyn Fn(&ConnectionStatus) + Send + Sync>;
pub type StatsCallback = Box<dyn Fn(&PingPongStats) + Send + Sync>;

#[derive(Default)]
pub struct ObserverRegistry {
    status: RwLock<Vec<StatusCallback>>,
    stats: RwLock<Vec<StatsCallback>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_status(&self, callback: StatusCallback) {
        self.status.write().push(callback);
    }

    pub fn subscribe_stats(&self, callback: StatsCallback) {
        self.stats.write().push(callback);
    }

    pub fn notify_status(&self, status: &ConnectionStatus) {
        for callback in self.status.read().iter() {
            callback(status);
        }
    }

    pub fn notify_stats(&self, stats: &PingPongStats) {
        for callback in self.stats.read().iter() {
            callback(stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_multicast_reaches_all_subscribers() {
        let registry = ObserverRegistry::new();
        let hits = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            registry.subscribe_status(Box::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }

        registry.notify_status(&ConnectionStatus::disconnected());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_stats_snapshot_delivered() {
        let registry = ObserverRegistry::new();
        let seen = Arc::new(AtomicU32::new(0));

        let seen_clone = seen.clone();
        registry.subscribe_stats(Box::new(move |stats| {
            seen_clone.store(stats.total_pings as u32, Ordering::SeqCst);
        }));

        let stats = PingPongStats {
            total_pings: 7,
            ..Default::default()
        };
        registry.notify_stats(&stats);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_notify_without_subscribers_is_noop() {
        let registry = ObserverRegistry::new();
        registry.notify_status(&ConnectionStatus::opened());
    }
}
