//! Per-channel engagement state: when did the bot last speak here.
//!
//! The in-memory store guards a plain map with a `std::sync::RwLock`. Every
//! access is a short synchronous lookup, never held across an `.await`, so
//! concurrent handlers simply interleave their reads and writes. Writes never
//! move a channel's timestamp backwards.

use std::{collections::HashMap, sync::RwLock};

use chrono::{DateTime, Utc};

/// Engagement state of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEngagement {
    pub last_spoke_at: Option<DateTime<Utc>>,
}

/// Keyed store of the last time the bot spoke in each channel.
pub trait EngagementStore: Send + Sync {
    /// Last time the bot spoke in `channel_id`, if ever.
    fn last_spoke(&self, channel_id: &str) -> Option<DateTime<Utc>>;

    /// Record that the bot spoke in `channel_id` at `at`. Older timestamps
    /// than the stored one are ignored.
    fn record_spoke(&self, channel_id: &str, at: DateTime<Utc>);

    fn engagement(&self, channel_id: &str) -> ChannelEngagement {
        ChannelEngagement {
            last_spoke_at: self.last_spoke(channel_id),
        }
    }
}

/// Process-lifetime store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryEngagementStore {
    channels: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryEngagementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of channels the bot has ever spoken in.
    pub fn len(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EngagementStore for InMemoryEngagementStore {
    fn last_spoke(&self, channel_id: &str) -> Option<DateTime<Utc>> {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(channel_id)
            .copied()
    }

    fn record_spoke(&self, channel_id: &str, at: DateTime<Utc>) {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(channel_id.to_string())
            .and_modify(|last| {
                if at > *last {
                    *last = at;
                }
            })
            .or_insert(at);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, chrono::Duration, std::sync::Arc};

    #[test]
    fn unknown_channel_has_no_state() {
        let store = InMemoryEngagementStore::new();
        assert_eq!(store.last_spoke("c1"), None);
        assert_eq!(store.engagement("c1").last_spoke_at, None);
        assert!(store.is_empty());
    }

    #[test]
    fn record_creates_then_overwrites() {
        let store = InMemoryEngagementStore::new();
        let t0 = Utc::now();
        store.record_spoke("c1", t0);
        assert_eq!(store.last_spoke("c1"), Some(t0));

        let t1 = t0 + Duration::seconds(5);
        store.record_spoke("c1", t1);
        assert_eq!(store.last_spoke("c1"), Some(t1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn older_write_never_moves_backwards() {
        let store = InMemoryEngagementStore::new();
        let t0 = Utc::now();
        store.record_spoke("c1", t0);
        store.record_spoke("c1", t0 - Duration::minutes(1));
        assert_eq!(store.last_spoke("c1"), Some(t0));
    }

    #[test]
    fn channels_are_independent() {
        let store = InMemoryEngagementStore::new();
        let t0 = Utc::now();
        store.record_spoke("c1", t0);
        assert_eq!(store.last_spoke("c2"), None);
    }

    #[tokio::test]
    async fn concurrent_writers_keep_latest() {
        let store = Arc::new(InMemoryEngagementStore::new());
        let base = Utc::now();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.record_spoke("c1", base + Duration::seconds(i));
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.last_spoke("c1"), Some(base + Duration::seconds(31)));
    }
}
