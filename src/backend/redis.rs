//! Redis store for the remote backend.

use super::remote::RemoteStore;
use crate::error::{Error, Result};
use deadpool_redis::{redis::AsyncCommands, Config as PoolConfig, Pool, Runtime};
use std::time::Duration;

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Default Redis connection pool size.
/// Override with REDIS_POOL_SIZE environment variable
pub const DEFAULT_POOL_SIZE: u32 = 16;

/// Configuration for the Redis store.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: u32,
    pub pool_size: u32,
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            host: "localhost".to_string(),
            port: 6379,
            username: None,
            password: None,
            database: 0,
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Build Redis connection string.
    pub fn connection_string(&self) -> String {
        let credentials = match (&self.username, &self.password) {
            (username, Some(password)) => format!(
                "{}:{}@",
                username.as_deref().unwrap_or("default"),
                password
            ),
            (Some(username), None) => format!("{}@", username),
            (None, None) => String::new(),
        };

        format!(
            "redis://{}{}:{}/{}",
            credentials, self.host, self.port, self.database
        )
    }
}

/// Redis-backed [`RemoteStore`] with connection pooling.
///
/// Clones share the pool, so one `RedisStore` can serve several differently-prefixed
/// caches.
///
/// # Example
///
/// ```no_run
/// # use typed_cache::backend::{RedisConfig, RedisStore};
/// # use typed_cache::Cache;
/// # async fn example() -> typed_cache::Result<()> {
/// let store = RedisStore::new(RedisConfig::default()).await?;
///
/// let users = Cache::new(store.clone().into_backend(), "users");
/// let sessions = Cache::new(store.into_backend(), "sessions");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Create new Redis store from configuration.
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let conn_str = config.connection_string();
        let store = Self::build(&conn_str, config.pool_size, Some(config.connection_timeout))?;

        info!(
            "✓ Redis store initialized: {}:{} (db {})",
            config.host, config.port, config.database
        );

        Ok(store)
    }

    /// Create from connection string directly.
    ///
    /// Pool size is determined by:
    /// 1. `REDIS_POOL_SIZE` environment variable (if set)
    /// 2. `DEFAULT_POOL_SIZE` constant (16)
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub async fn from_connection_string(conn_str: &str) -> Result<Self> {
        let pool_size = std::env::var("REDIS_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);

        let store = Self::build(conn_str, pool_size, None)?;

        info!(
            "✓ Redis store initialized from connection string (pool size: {})",
            pool_size
        );

        Ok(store)
    }

    fn build(conn_str: &str, pool_size: u32, wait_timeout: Option<Duration>) -> Result<Self> {
        let mut cfg = PoolConfig::from_url(conn_str);
        let mut pool_cfg = deadpool_redis::PoolConfig::new(pool_size as usize);
        pool_cfg.timeouts.wait = wait_timeout;
        pool_cfg.timeouts.create = wait_timeout;
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::BackendError(format!("Failed to create Redis pool: {}", e)))?;

        Ok(RedisStore { pool })
    }

    /// Wrap into a typed cache backend.
    pub fn into_backend(self) -> super::Backend {
        super::Backend::from(self)
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
        }
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }
}

/// Longest TTL sent as an expiry. Redis rejects PSETEX deadlines past `i64::MAX` ms, so
/// anything longer is stored without one, the same as the in-process backend does.
const MAX_TTL_MILLIS: u64 = (i64::MAX / 2) as u64;

/// Redis PSETEX takes whole milliseconds; never round a positive TTL down to zero.
/// `None` when the TTL is too long to expire in practice.
fn ttl_millis(ttl: Duration) -> Option<u64> {
    u64::try_from(ttl.as_millis())
        .ok()
        .filter(|&millis| millis <= MAX_TTL_MILLIS)
        .map(|millis| millis.max(1))
}

impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        if value.is_some() {
            debug!("✓ Redis GET {} -> HIT", key);
        } else {
            debug!("✓ Redis GET {} -> MISS", key);
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;

        match ttl.and_then(ttl_millis) {
            Some(millis) => {
                conn.pset_ex::<_, _, ()>(key, value, millis)
                    .await
                    .map_err(|e| {
                        Error::BackendError(format!("Redis PSETEX failed for key {}: {}", key, e))
                    })?;
                debug!("✓ Redis SET {} (TTL: {}ms)", key, millis);
            }
            None => {
                conn.set::<_, _, ()>(key, value).await.map_err(|e| {
                    Error::BackendError(format!("Redis SET failed for key {}: {}", key, e))
                })?;
                debug!("✓ Redis SET {}", key);
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;

        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL failed for key {}: {}", key, e)))?;

        debug!("✓ Redis DELETE {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let exists: bool = conn.exists(key).await.map_err(|e| {
            Error::BackendError(format!("Redis EXISTS failed for key {}: {}", key, e))
        })?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;

        let pong: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong.contains("PONG"))
    }
}
