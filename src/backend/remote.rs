//! Adapter from the typed backend contract onto an opaque byte store.
//!
//! A [`RemoteStore`] only knows bytes, TTLs and a not-found signal (`Ok(None)`).
//! [`RemoteBackend`] turns payloads into versioned envelopes on the way in and validates
//! them on the way out. Expiry is left to the store's own TTL support.

use super::CacheBackend;
use crate::error::Result;
use crate::serialization::{decode_payload, encode_payload};
use crate::value::Payload;
use std::time::Duration;

/// Key-value store with native TTL, e.g. Redis.
///
/// Implementations must report an absent key as `Ok(None)` and every other problem as
/// `Err`. Retry policy, pooling and wire protocol live here, not in the cache.
#[allow(async_fn_in_trait)]
pub trait RemoteStore: Send + Sync + Clone {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrite `key`. `None` stores without expiry and clears any previous TTL.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// [`CacheBackend`] over any [`RemoteStore`].
///
/// Cloning shares the underlying store handle (and its connection pool).
#[derive(Clone)]
pub struct RemoteBackend<S: RemoteStore> {
    store: S,
}

impl<S: RemoteStore> RemoteBackend<S> {
    pub fn new(store: S) -> Self {
        RemoteBackend { store }
    }

    /// Get store reference (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: RemoteStore> CacheBackend for RemoteBackend<S> {
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        match self.store.get(key).await? {
            Some(bytes) => decode_payload(&bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Payload, ttl: Option<Duration>) -> Result<()> {
        let bytes = encode_payload(value)?;
        self.store.set(key, bytes, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.store.exists(key).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.store.health_check().await
    }
}
