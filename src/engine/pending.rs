//! In-flight command guard
//!
//! The only concurrency-control primitive in the engine: while a key is held
//! here, no new command may be dispatched for it. Entries carry an explicit
//! monotonic release deadline instead of relying on timer callbacks; the
//! deadline set at dispatch doubles as the no-acknowledgment timeout, and an
//! acknowledgment re-arms it to ack-time + settle delay. Expired entries are
//! purged at the start of every tick, so a key can never stay locked forever.

use std::collections::HashMap;
use tokio::time::Instant;

use crate::types::PairKey;

#[derive(Debug, Default)]
pub struct PendingGuard {
    deadlines: HashMap<PairKey, Instant>,
}

impl PendingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a command is currently in flight for this key
    pub fn contains(&self, key: &PairKey) -> bool {
        self.deadlines.contains_key(key)
    }

    /// Hold the key with a release deadline. Called the instant a command is
    /// dispatched, before the network call is made.
    pub fn hold(&mut self, key: PairKey, release_at: Instant) {
        self.deadlines.insert(key, release_at);
    }

    /// Re-arm the deadline on acknowledgment so the backend's book view can
    /// settle before the next command for this key. No-op for unknown keys
    /// (a late ack after the timeout purge).
    pub fn settle(&mut self, key: &PairKey, release_at: Instant) {
        if let Some(deadline) = self.deadlines.get_mut(key) {
            *deadline = release_at;
        }
    }

    /// Drop every entry whose deadline has passed; returns how many were
    /// released. Called at the start of each tick.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.deadlines.len();
        self.deadlines.retain(|_, deadline| *deadline > now);
        before - self.deadlines.len()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketSide, Ticker};
    use std::time::Duration;

    fn key() -> PairKey {
        PairKey::new(Ticker::from("T1"), MarketSide::Yes)
    }

    #[tokio::test(start_paused = true)]
    async fn held_key_blocks_until_deadline() {
        let mut guard = PendingGuard::new();
        let now = Instant::now();
        guard.hold(key(), now + Duration::from_millis(500));

        assert!(guard.contains(&key()));
        assert_eq!(guard.purge_expired(now + Duration::from_millis(499)), 0);
        assert!(guard.contains(&key()));

        // Deadline passed: key becomes eligible again
        assert_eq!(guard.purge_expired(now + Duration::from_millis(500)), 1);
        assert!(!guard.contains(&key()));
    }

    #[tokio::test(start_paused = true)]
    async fn ack_rearms_the_deadline() {
        let mut guard = PendingGuard::new();
        let now = Instant::now();
        guard.hold(key(), now + Duration::from_millis(2000));

        // Ack arrives at t+100 with a 500ms settle delay
        guard.settle(&key(), now + Duration::from_millis(600));

        assert_eq!(guard.purge_expired(now + Duration::from_millis(599)), 0);
        assert_eq!(guard.purge_expired(now + Duration::from_millis(601)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_ack_after_purge_is_ignored() {
        let mut guard = PendingGuard::new();
        let now = Instant::now();
        guard.hold(key(), now + Duration::from_millis(500));
        guard.purge_expired(now + Duration::from_secs(1));

        guard.settle(&key(), now + Duration::from_secs(5));
        assert!(guard.is_empty());
    }
}
