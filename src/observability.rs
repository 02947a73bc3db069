//! Metrics hooks for cache operations.
//!
//! Implement [`CacheMetrics`] to feed cache activity into your monitoring system and
//! attach it with [`Cache::with_metrics`](crate::Cache::with_metrics):
//!
//! ```ignore
//! use typed_cache::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("cache_hits").inc();
//!     }
//!     // ... implement other methods
//! }
//!
//! let cache = Cache::new(backend, "users").with_metrics(Arc::new(PrometheusMetrics));
//! ```
//!
//! Hooks only observe. Errors reported to `record_error` are still returned to the caller.
//!
//! - `record_hit()` / `record_miss()` - reads, with lookup duration
//! - `record_compute()` - cache-aside computation on a miss, with compute duration
//! - `record_set()` / `record_delete()` - writes, with operation duration
//! - `record_error()` - any failed operation
//!
//! Keys passed to hooks are storage keys, i.e. already prefixed.

use std::time::Duration;

/// Trait for cache metrics collection.
///
/// Default method bodies write to the `log` facade at debug level.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a value computed after a miss.
    fn record_compute(&self, key: &str, duration: Duration) {
        debug!("Cache COMPUTE: {} took {:?}", key, duration);
    }

    /// Record a cache set operation.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a cache delete operation.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("Cache DELETE: {} took {:?}", key, duration);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_compute(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics that only log, using the trait's default bodies.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_hit("key", Duration::from_secs(1));
        metrics.record_miss("key", Duration::from_secs(2));
        metrics.record_error("key", "boom");
    }

    #[test]
    fn test_log_metrics_uses_defaults() {
        let _ = env_logger::builder().is_test(true).try_init();
        let metrics: &dyn CacheMetrics = &LogMetrics;
        metrics.record_compute("key", Duration::from_millis(3));
        metrics.record_set("key", Duration::from_millis(1));
    }
}
