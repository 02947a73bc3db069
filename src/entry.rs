//! TTL-aware entry storage shared by in-process caches.
//!
//! One map, one reader/writer lock. Expiry is a read-time predicate: nothing runs in the
//! background, and an expired entry is removed by the first read that notices it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// One stored value with optional expiration.
#[derive(Clone, Debug)]
pub struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    /// `None` never expires, and neither does a TTL too large to place on the clock.
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.and_then(|d| Instant::now().checked_add(d));
        Entry { value, expires_at }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Expired once `now` has reached the deadline.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

/// Point-in-time counters over an [`EntryStore`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total_entries: usize,
    /// Entries past their deadline that no read has removed yet.
    pub expired_entries: usize,
}

/// Key to [`Entry`] map guarded by a single `RwLock`.
///
/// Cloning yields another handle onto the same map.
pub struct EntryStore<V> {
    entries: Arc<RwLock<HashMap<String, Entry<V>>>>,
}

impl<V> Clone for EntryStore<V> {
    fn clone(&self) -> Self {
        EntryStore {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> Default for EntryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EntryStore<V> {
    pub fn new() -> Self {
        EntryStore {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store `value`, replacing any previous entry and its deadline.
    pub async fn put(&self, key: &str, value: V, ttl: Option<Duration>) {
        let entry = Entry::new(value, ttl);
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Remove `key`. Absent keys are fine.
    pub async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every expired entry now. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    pub async fn stats(&self) -> StoreStats {
        self.for_each_live(|_, _| {}).await
    }

    /// Apply `f` to every live entry under the shared lock.
    ///
    /// The returned counters describe the same snapshot `f` saw.
    pub async fn for_each_live<F>(&self, mut f: F) -> StoreStats
    where
        F: FnMut(&str, &Entry<V>),
    {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let mut expired_entries = 0;
        for (key, entry) in entries.iter() {
            if entry.is_expired_at(now) {
                expired_entries += 1;
            } else {
                f(key, entry);
            }
        }

        StoreStats {
            total_entries: entries.len(),
            expired_entries,
        }
    }
}

impl<V: Clone> EntryStore<V> {
    /// Live value for `key`, removing the entry if it has expired.
    ///
    /// The lookup runs under the shared lock. Only when the entry turns out to be expired
    /// is the exclusive lock taken, and the deadline is checked again under it: another
    /// reader may already have removed the entry, or a writer may have replaced it with a
    /// fresh one that must survive.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}
