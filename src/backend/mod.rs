//! Cache backend implementations.

use crate::error::Result;
use crate::value::Payload;
use std::time::Duration;

pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod remote;

pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisConfig, RedisStore};
pub use remote::{RemoteBackend, RemoteStore};

/// Trait for cache backend implementations.
///
/// Backends receive keys that are already namespaced and store typed [`Payload`]s.
/// Type checking of reads happens above, in [`Cache`](crate::Cache).
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Backend implementations should use interior mutability (RwLock, Mutex, or external storage).
///
/// **ASYNC:** All methods are async and must be awaited. None of them spawn background work.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve a payload by key.
    ///
    /// # Returns
    /// - `Ok(Some(payload))` - Value found and not expired
    /// - `Ok(None)` - Cache miss (absent or expired)
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, undecodable entry, etc.)
    async fn get(&self, key: &str) -> Result<Option<Payload>>;

    /// Store a payload, replacing any previous value and TTL.
    ///
    /// # Arguments
    /// - `key`: Cache key
    /// - `value`: Typed payload
    /// - `ttl`: Time-to-live. `None` = never expires
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn set(&self, key: &str, value: Payload, ttl: Option<Duration>) -> Result<()>;

    /// Remove a value. Removing an absent key succeeds.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if key exists in cache (optional optimization).
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Backend chosen at construction time from configuration.
///
/// Lets callers hold a `Cache<Backend>` without naming the concrete storage.
#[derive(Clone)]
pub enum Backend {
    InMemory(InMemoryBackend),
    #[cfg(feature = "redis")]
    Redis(RemoteBackend<RedisStore>),
}

impl Backend {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::InMemory(_) => "inmemory",
            #[cfg(feature = "redis")]
            Backend::Redis(_) => "redis",
        }
    }
}

impl From<InMemoryBackend> for Backend {
    fn from(backend: InMemoryBackend) -> Self {
        Backend::InMemory(backend)
    }
}

#[cfg(feature = "redis")]
impl From<RedisStore> for Backend {
    fn from(store: RedisStore) -> Self {
        Backend::Redis(RemoteBackend::new(store))
    }
}

impl CacheBackend for Backend {
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        match self {
            Backend::InMemory(b) => b.get(key).await,
            #[cfg(feature = "redis")]
            Backend::Redis(b) => b.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: Payload, ttl: Option<Duration>) -> Result<()> {
        match self {
            Backend::InMemory(b) => b.set(key, value, ttl).await,
            #[cfg(feature = "redis")]
            Backend::Redis(b) => b.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Backend::InMemory(b) => b.delete(key).await,
            #[cfg(feature = "redis")]
            Backend::Redis(b) => b.delete(key).await,
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self {
            Backend::InMemory(b) => b.exists(key).await,
            #[cfg(feature = "redis")]
            Backend::Redis(b) => b.exists(key).await,
        }
    }

    async fn health_check(&self) -> Result<bool> {
        match self {
            Backend::InMemory(b) => b.health_check().await,
            #[cfg(feature = "redis")]
            Backend::Redis(b) => b.health_check().await,
        }
    }
}
