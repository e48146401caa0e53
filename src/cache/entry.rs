//! Time-stamped cache entries with TTL-based expiry

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// A cached value together with the time it was fetched
#[derive(Debug, Clone)]
pub struct CachedEntry<T> {
    pub value: T,

    /// When the value was fetched from its source
    pub fetched_at: DateTime<Utc>,
}

impl<T> CachedEntry<T> {
    /// Creates an entry stamped with the current time
    pub fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the entry is older than `ttl`
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Keyed in-memory cache whose entries expire after a fixed TTL
///
/// Stale entries are kept until overwritten so callers can tell a first
/// fetch from a refresh.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    ttl: Duration,
    entries: HashMap<String, CachedEntry<T>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value if present and not stale
    pub fn get_fresh(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_stale(self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Returns true if an entry exists for `key`, fresh or not
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), CachedEntry::new(value));
    }

    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, key: &str, by: Duration) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.fetched_at = entry.fetched_at - by;
        }
    }
}
