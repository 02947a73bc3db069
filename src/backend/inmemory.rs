//! In-memory cache backend (default, thread-safe, async).
//!
//! Payloads are kept as typed values, never serialized. The whole map sits behind one
//! reader/writer lock, see [`EntryStore`]. TTL expiration is handled on access.

use super::CacheBackend;
use crate::entry::{EntryStore, StoreStats};
use crate::error::Result;
use crate::value::Payload;
use std::time::Duration;

/// Thread-safe async in-memory cache backend.
///
/// Clones share the same store, so several differently-prefixed
/// [`Cache`](crate::Cache)s can sit on one `InMemoryBackend`.
///
/// # Example
///
/// ```no_run
/// use typed_cache::backend::{CacheBackend, InMemoryBackend};
/// use typed_cache::value::Payload;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("key1", Payload::Str("value".into()), None).await?;
///     assert!(backend.get("key1").await?.is_some());
///
///     backend
///         .set("key2", Payload::Int64(1), Some(Duration::from_secs(300)))
///         .await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: EntryStore<Payload>,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: EntryStore::new(),
        }
    }

    /// Current number of entries, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    /// Remove all expired entries now instead of waiting for reads to find them.
    pub async fn purge_expired(&self) -> usize {
        let purged = self.store.purge_expired().await;
        debug!("✓ InMemory PURGE {} expired entries", purged);
        purged
    }

    /// Get memory statistics.
    pub async fn stats(&self) -> CacheStats {
        let mut total_bytes = 0;
        let StoreStats {
            total_entries,
            expired_entries,
        } = self
            .store
            .for_each_live(|key, entry| total_bytes += key.len() + entry.value().size_hint())
            .await;

        CacheStats {
            total_entries,
            expired_entries,
            total_bytes,
        }
    }

    /// Print cache statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Cache Stats: {} entries ({} expired), {} bytes",
            stats.total_entries, stats.expired_entries, stats.total_bytes
        );
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        let value = self.store.get(key).await;
        if value.is_some() {
            debug!("✓ InMemory GET {} -> HIT", key);
        } else {
            debug!("✓ InMemory GET {} -> MISS", key);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Payload, ttl: Option<Duration>) -> Result<()> {
        self.store.put(key, value, ttl).await;

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key).await;
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    /// Keys plus approximate payload sizes of live entries.
    pub total_bytes: usize,
}
