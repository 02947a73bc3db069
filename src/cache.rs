//! Typed cache facade - main entry point for cache operations.

use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::key::Namespace;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::value::CacheValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// TTL meaning "never expires".
pub const NO_EXPIRATION: Duration = Duration::ZERO;

fn expiry(ttl: Duration) -> Option<Duration> {
    if ttl.is_zero() {
        None
    } else {
        Some(ttl)
    }
}

/// Typed cache over one backend and one fixed key prefix.
///
/// Every key is rewritten through the prefix before it reaches the backend, so caches
/// with different prefixes can share one backend handle safely. `Cache` is cheap to
/// clone; clones share the backend and metrics.
///
/// # Example
///
/// ```
/// use typed_cache::{backend::InMemoryBackend, Cache, NO_EXPIRATION};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> typed_cache::Result<()> {
/// let cache = Cache::new(InMemoryBackend::new(), "users");
///
/// cache.set("42:visits", 10i64, NO_EXPIRATION).await?;
/// assert_eq!(cache.get::<i64>("42:visits").await?, Some(10));
///
/// let name = cache
///     .get_or_compute("42:name", || async {
///         ("Alice".to_string(), Duration::from_secs(60))
///     })
///     .await?;
/// assert_eq!(name, "Alice");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Cache<B: CacheBackend> {
    backend: B,
    namespace: Namespace,
    metrics: Arc<dyn CacheMetrics>,
}

impl<B: CacheBackend> Cache<B> {
    /// Create a cache over `backend` whose keys live under `prefix`.
    ///
    /// An empty prefix stores caller keys unchanged.
    pub fn new(backend: B, prefix: impl Into<String>) -> Self {
        Cache {
            backend,
            namespace: Namespace::new(prefix),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn prefix(&self) -> &str {
        self.namespace.prefix()
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read the value stored under `key`.
    ///
    /// # Returns
    /// - `Ok(Some(value))` - live value of family `T`
    /// - `Ok(None)` - never written, deleted, or expired
    ///
    /// # Errors
    ///
    /// - `Error::TypeMismatch`: the key holds another family
    /// - `Error::BackendError` and decode errors from the backend
    pub async fn get<T: CacheValue>(&self, key: &str) -> Result<Option<T>> {
        let storage_key = self.namespace.key(key);
        let timer = Instant::now();

        let payload = match self.backend.get(&storage_key).await {
            Ok(payload) => payload,
            Err(e) => return Err(self.failed(&storage_key, e)),
        };

        let Some(payload) = payload else {
            self.metrics.record_miss(&storage_key, timer.elapsed());
            return Ok(None);
        };

        let found = payload.family();
        match T::from_payload(payload) {
            Ok(value) => {
                self.metrics.record_hit(&storage_key, timer.elapsed());
                Ok(Some(value))
            }
            Err(_) => Err(self.failed(
                &storage_key,
                Error::TypeMismatch {
                    key: key.to_string(),
                    expected: T::FAMILY,
                    found,
                },
            )),
        }
    }

    /// Store `value` under `key`, replacing any previous value and TTL.
    ///
    /// `ttl` of [`NO_EXPIRATION`] keeps the value until it is deleted or overwritten.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    pub async fn set<T: CacheValue>(&self, key: &str, value: T, ttl: Duration) -> Result<()> {
        let storage_key = self.namespace.key(key);
        let timer = Instant::now();

        match self
            .backend
            .set(&storage_key, value.into_payload(), expiry(ttl))
            .await
        {
            Ok(()) => {
                self.metrics.record_set(&storage_key, timer.elapsed());
                Ok(())
            }
            Err(e) => Err(self.failed(&storage_key, e)),
        }
    }

    /// Cache-aside read: return the cached value, or compute, store and return it.
    ///
    /// On a hit `compute` is not called. On a miss it is called exactly once, and its
    /// `(value, ttl)` is written with [`set`](Self::set) before the value is returned.
    ///
    /// Concurrent misses on the same key are not coalesced: each caller computes and
    /// writes, and the last write wins. No lock is held while `compute` runs.
    ///
    /// # Errors
    ///
    /// - Errors from the initial read, including `Error::TypeMismatch`; `compute` is not
    ///   called and the stored value is left alone
    /// - Errors from the write-back. The computed value is discarded and the call fails.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, compute: F) -> Result<T>
    where
        T: CacheValue,
        F: FnOnce() -> Fut,
        Fut: Future<Output = (T, Duration)>,
    {
        self.try_get_or_compute(key, || async move { Ok::<_, Error>(compute().await) })
            .await
    }

    /// Fallible cache-aside read.
    ///
    /// Same as [`get_or_compute`](Self::get_or_compute), but `compute` may fail. Its error
    /// is returned unchanged and nothing is written. Cache errors are converted into the
    /// caller's error type through `From<Error>`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let user_count = cache
    ///     .try_get_or_compute("user_count", || async {
    ///         let n = db.count_users().await?;
    ///         Ok::<_, AppError>((n, Duration::from_secs(30)))
    ///     })
    ///     .await?;
    /// ```
    pub async fn try_get_or_compute<T, F, Fut, E>(
        &self,
        key: &str,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: CacheValue,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(T, Duration), E>>,
        E: From<Error>,
    {
        if let Some(value) = self.get::<T>(key).await? {
            return Ok(value);
        }

        let timer = Instant::now();
        let (value, ttl) = compute().await?;
        self.metrics
            .record_compute(&self.namespace.key(key), timer.elapsed());

        self.set(key, value.clone(), ttl).await?;
        Ok(value)
    }

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let storage_key = self.namespace.key(key);
        let timer = Instant::now();

        match self.backend.delete(&storage_key).await {
            Ok(()) => {
                self.metrics.record_delete(&storage_key, timer.elapsed());
                Ok(())
            }
            Err(e) => Err(self.failed(&storage_key, e)),
        }
    }

    /// Whether a live value of any family is stored under `key`.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let storage_key = self.namespace.key(key);
        self.backend
            .exists(&storage_key)
            .await
            .map_err(|e| self.failed(&storage_key, e))
    }

    /// Health check - verify the backend is reachable.
    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }

    // ========================================================================
    // serde types through the `Any` family
    // ========================================================================

    /// Read a serde type stored with [`set_json`](Self::set_json).
    ///
    /// # Errors
    ///
    /// - `Error::DeserializationError`: the stored JSON does not fit `T`
    /// - Everything [`get`](Self::get) returns
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get::<Value>(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store any serde type as a JSON value.
    ///
    /// # Errors
    ///
    /// - `Error::SerializationError`: `value` cannot be represented as JSON
    /// - Backend failures
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let value =
            serde_json::to_value(value).map_err(|e| Error::SerializationError(e.to_string()))?;
        self.set(key, value, ttl).await
    }

    /// Cache-aside read for serde types.
    pub async fn get_or_compute_json<T, F, Fut>(&self, key: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = (T, Duration)>,
    {
        self.try_get_or_compute_json(key, || async move { Ok::<_, Error>(compute().await) })
            .await
    }

    /// Fallible cache-aside read for serde types.
    pub async fn try_get_or_compute_json<T, F, Fut, E>(
        &self,
        key: &str,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(T, Duration), E>>,
        E: From<Error>,
    {
        if let Some(value) = self.get_json::<T>(key).await? {
            return Ok(value);
        }

        let timer = Instant::now();
        let (value, ttl) = compute().await?;
        self.metrics
            .record_compute(&self.namespace.key(key), timer.elapsed());

        self.set_json(key, &value, ttl).await?;
        Ok(value)
    }

    fn failed(&self, storage_key: &str, error: Error) -> Error {
        self.metrics.record_error(storage_key, &error.to_string());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::value::{Family, Payload};
    use chrono::{DateTime, Utc};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: u64,
        name: String,
        tags: Vec<String>,
    }

    /// Backend whose reads always miss and whose writes always fail.
    #[derive(Clone)]
    struct ReadOnlyBackend;

    impl CacheBackend for ReadOnlyBackend {
        async fn get(&self, _key: &str) -> Result<Option<Payload>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Payload, _ttl: Option<Duration>) -> Result<()> {
            Err(Error::BackendError("read-only replica".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(Error::BackendError("read-only replica".to_string()))
        }
    }

    #[test]
    fn test_zero_ttl_means_no_expiry() {
        assert_eq!(expiry(NO_EXPIRATION), None);
        assert_eq!(
            expiry(Duration::from_millis(5)),
            Some(Duration::from_millis(5))
        );
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = Cache::new(InMemoryBackend::new(), "t");

        assert_eq!(cache.get::<i64>("k").await.expect("get"), None);
        cache
            .set("k", 5i64, Duration::from_secs(60))
            .await
            .expect("set");
        assert_eq!(cache.get::<i64>("k").await.expect("get"), Some(5));
    }

    #[tokio::test]
    async fn test_every_family_roundtrips() {
        let cache = Cache::new(InMemoryBackend::new(), "t");
        let now: DateTime<Utc> = Utc::now();

        cache.set("i64", -3i64, NO_EXPIRATION).await.expect("set");
        cache.set("int", 3isize, NO_EXPIRATION).await.expect("set");
        cache.set("time", now, NO_EXPIRATION).await.expect("set");
        cache
            .set("bytes", vec![9u8, 8], NO_EXPIRATION)
            .await
            .expect("set");
        cache
            .set("str", "s".to_string(), NO_EXPIRATION)
            .await
            .expect("set");

        assert_eq!(cache.get::<i64>("i64").await.expect("get"), Some(-3));
        assert_eq!(cache.get::<isize>("int").await.expect("get"), Some(3));
        assert_eq!(cache.get::<DateTime<Utc>>("time").await.expect("get"), Some(now));
        assert_eq!(
            cache.get::<Vec<u8>>("bytes").await.expect("get"),
            Some(vec![9, 8])
        );
        assert_eq!(
            cache.get::<String>("str").await.expect("get"),
            Some("s".to_string())
        );
    }

    #[tokio::test]
    async fn test_type_mismatch_is_an_error() {
        let cache = Cache::new(InMemoryBackend::new(), "t");
        cache.set("k", 42i64, NO_EXPIRATION).await.expect("set");

        let err = cache.get::<Vec<u8>>("k").await.expect_err("wrong family");
        assert_eq!(
            err,
            Error::TypeMismatch {
                key: "k".to_string(),
                expected: Family::Bytes,
                found: Family::Int64,
            }
        );

        // The stored value is untouched
        assert_eq!(cache.get::<i64>("k").await.expect("get"), Some(42));
    }

    #[tokio::test]
    async fn test_get_or_compute_runs_once() {
        let cache = Cache::new(InMemoryBackend::new(), "t");
        let calls = &AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_compute("answer", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (42i64, NO_EXPIRATION)
                })
                .await
                .expect("get_or_compute");
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_uses_returned_ttl() {
        let cache = Cache::new(InMemoryBackend::new(), "t");

        cache
            .get_or_compute("k", || async { (1i64, Duration::from_millis(20)) })
            .await
            .expect("get_or_compute");
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get::<i64>("k").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_compute_failure_propagates_without_write() {
        #[derive(Debug, PartialEq)]
        enum AppError {
            NotFound,
            Cache(Error),
        }

        impl From<Error> for AppError {
            fn from(e: Error) -> Self {
                AppError::Cache(e)
            }
        }

        let backend = InMemoryBackend::new();
        let cache = Cache::new(backend.clone(), "t");

        let result = cache
            .try_get_or_compute::<i64, _, _, _>("k", || async { Err(AppError::NotFound) })
            .await;

        assert_eq!(result, Err(AppError::NotFound));
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_write_back_failure_fails_the_call() {
        let cache = Cache::new(ReadOnlyBackend, "t");
        let calls = &AtomicUsize::new(0);

        let result = cache
            .get_or_compute("k", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                (7i64, NO_EXPIRATION)
            })
            .await;

        assert_eq!(
            result,
            Err(Error::BackendError("read-only replica".to_string()))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_does_not_overwrite_other_family() {
        let cache = Cache::new(InMemoryBackend::new(), "t");
        cache
            .set("k", "text".to_string(), NO_EXPIRATION)
            .await
            .expect("set");

        let result = cache
            .get_or_compute("k", || async { (1i64, NO_EXPIRATION) })
            .await;

        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
        assert_eq!(
            cache.get::<String>("k").await.expect("get"),
            Some("text".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = Cache::new(InMemoryBackend::new(), "t");

        cache.delete("never-written").await.expect("delete");
        cache.set("k", 1i64, NO_EXPIRATION).await.expect("set");
        cache.delete("k").await.expect("delete");
        assert_eq!(cache.get::<i64>("k").await.expect("get"), None);
        assert!(!cache.exists("k").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_json_roundtrip() {
        let cache = Cache::new(InMemoryBackend::new(), "profiles");
        let profile = Profile {
            id: 1,
            name: "Alice".to_string(),
            tags: vec!["admin".to_string()],
        };

        cache
            .set_json("1", &profile, NO_EXPIRATION)
            .await
            .expect("set_json");
        let loaded: Option<Profile> = cache.get_json("1").await.expect("get_json");
        assert_eq!(loaded, Some(profile));
    }

    #[tokio::test]
    async fn test_json_shape_mismatch_is_deserialization_error() {
        let cache = Cache::new(InMemoryBackend::new(), "profiles");
        cache
            .set("1", serde_json::json!({"unexpected": true}), NO_EXPIRATION)
            .await
            .expect("set");

        let result = cache.get_json::<Profile>("1").await;
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[tokio::test]
    async fn test_get_or_compute_json() {
        let cache = Cache::new(InMemoryBackend::new(), "profiles");
        let calls = &AtomicUsize::new(0);

        for _ in 0..2 {
            let profile: Profile = cache
                .get_or_compute_json("2", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let profile = Profile {
                        id: 2,
                        name: "Bob".to_string(),
                        tags: vec![],
                    };
                    (profile, Duration::from_secs(60))
                })
                .await
                .expect("get_or_compute_json");
            assert_eq!(profile.name, "Bob");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_custom_metrics() {
        #[derive(Default)]
        struct TestMetrics {
            events: Mutex<Vec<String>>,
        }

        impl CacheMetrics for TestMetrics {
            fn record_hit(&self, key: &str, _duration: Duration) {
                self.push(format!("hit {}", key));
            }

            fn record_miss(&self, key: &str, _duration: Duration) {
                self.push(format!("miss {}", key));
            }

            fn record_compute(&self, key: &str, _duration: Duration) {
                self.push(format!("compute {}", key));
            }

            fn record_set(&self, key: &str, _duration: Duration) {
                self.push(format!("set {}", key));
            }

            fn record_error(&self, key: &str, _error: &str) {
                self.push(format!("error {}", key));
            }
        }

        impl TestMetrics {
            fn push(&self, event: String) {
                self.events.lock().expect("Failed to lock events").push(event);
            }
        }

        let metrics = Arc::new(TestMetrics::default());
        let cache = Cache::new(InMemoryBackend::new(), "m").with_metrics(metrics.clone());

        cache
            .get_or_compute("k", || async { (1i64, NO_EXPIRATION) })
            .await
            .expect("get_or_compute");
        cache.get::<i64>("k").await.expect("get");
        let _ = cache.get::<String>("k").await;

        let events = metrics.events.lock().expect("Failed to lock events").clone();
        assert_eq!(
            events,
            vec!["miss m:k", "compute m:k", "set m:k", "hit m:k", "error m:k"]
        );
    }
}
