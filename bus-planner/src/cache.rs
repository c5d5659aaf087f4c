//! Short-lived memo of direct-trip searches.
//!
//! Nearby requests (map panning, repeated plan clicks) tend to hit the same
//! expanded stop sets and window. Entries expire after a minute so a reloaded
//! feed is never served stale for long; the memo is also owned by the engine
//! and dropped with it on reload.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::sync::Cache as MokaCache;

use crate::domain::{SearchMode, TimeWindow};
use crate::planner::DirectTrip;

/// Memo key: (expanded start set, expanded end set, date, window, mode).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectKey {
    start: Vec<String>,
    end: Vec<String>,
    date: NaiveDate,
    window: (i64, i64),
    mode: SearchMode,
}

impl DirectKey {
    pub fn new(
        start: &BTreeSet<String>,
        end: &BTreeSet<String>,
        date: NaiveDate,
        window: &TimeWindow,
        mode: SearchMode,
    ) -> Self {
        Self {
            start: start.iter().cloned().collect(),
            end: end.iter().cloned().collect(),
            date,
            window: (window.start(), window.end()),
            mode,
        }
    }
}

/// Cached direct-trip result.
pub type DirectEntry = Arc<Vec<DirectTrip>>;

/// Configuration for the memo.
#[derive(Debug, Clone)]
pub struct MemoConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

/// Direct-trip results keyed by [`DirectKey`].
pub struct DirectMemo {
    entries: MokaCache<DirectKey, DirectEntry>,
}

impl DirectMemo {
    /// Create a new memo with the given configuration.
    pub fn new(config: &MemoConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { entries }
    }

    pub fn get(&self, key: &DirectKey) -> Option<DirectEntry> {
        self.entries.get(key)
    }

    pub fn insert(&self, key: DirectKey, entry: DirectEntry) {
        self.entries.insert(key, entry);
    }

    /// Return the cached entry or compute and store it.
    pub fn get_or_insert_with(&self, key: DirectKey, compute: impl FnOnce() -> Vec<DirectTrip>) -> DirectEntry {
        self.entries.get_with(key, || Arc::new(compute()))
    }

    /// Approximate entry count (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for DirectMemo {
    fn default() -> Self {
        Self::new(&MemoConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(mode: SearchMode) -> DirectKey {
        let start = BTreeSet::from(["A".to_string(), "B".to_string()]);
        let end = BTreeSet::from(["C".to_string()]);
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let window = TimeWindow::new(28_800, 43_200).unwrap();
        DirectKey::new(&start, &end, date, &window, mode)
    }

    #[test]
    fn default_config() {
        let config = MemoConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.max_capacity, 1000);
    }

    #[test]
    fn mode_is_part_of_key() {
        assert_ne!(key(SearchMode::Depart), key(SearchMode::Arrive));
        assert_eq!(key(SearchMode::Depart), key(SearchMode::Depart));
    }

    #[test]
    fn computes_once() {
        let memo = DirectMemo::default();
        let mut calls = 0;
        memo.get_or_insert_with(key(SearchMode::Depart), || {
            calls += 1;
            Vec::new()
        });
        memo.get_or_insert_with(key(SearchMode::Depart), || {
            calls += 1;
            Vec::new()
        });
        assert_eq!(calls, 1);
        assert!(memo.get(&key(SearchMode::Depart)).is_some());
        assert!(memo.get(&key(SearchMode::Arrive)).is_none());
    }

    #[test]
    fn invalidate_clears() {
        let memo = DirectMemo::default();
        memo.insert(key(SearchMode::Depart), Arc::new(Vec::new()));
        memo.invalidate_all();
        assert!(memo.get(&key(SearchMode::Depart)).is_none());
    }
}
