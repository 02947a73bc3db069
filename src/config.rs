//! Cache construction from settings.
//!
//! ```no_run
//! use typed_cache::{Cache, CacheConfig};
//!
//! # async fn example() -> typed_cache::Result<()> {
//! // CACHE_BACKEND=redis REDIS_HOST=cache.internal CACHE_PREFIX=billing
//! let cache = Cache::from_config(CacheConfig::from_env()?).await?;
//! cache.set("invoice:17:total", 1999i64, typed_cache::NO_EXPIRATION).await?;
//! # Ok(())
//! # }
//! ```

use crate::backend::{Backend, InMemoryBackend};
#[cfg(feature = "redis")]
use crate::backend::{RedisConfig, RedisStore};
use crate::cache::Cache;
use crate::error::{Error, Result};
use std::str::FromStr;

/// Which storage a cache is built on.
#[derive(Clone, Debug, Default)]
pub enum BackendConfig {
    #[default]
    InMemory,
    #[cfg(feature = "redis")]
    Redis(RedisConfig),
}

/// Everything needed to build a [`Cache`].
#[derive(Clone, Debug, Default)]
pub struct CacheConfig {
    /// Key prefix; empty stores caller keys unchanged.
    pub prefix: String,
    pub backend: BackendConfig,
}

impl CacheConfig {
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        CacheConfig {
            prefix: prefix.into(),
            backend: BackendConfig::InMemory,
        }
    }

    #[cfg(feature = "redis")]
    pub fn redis(prefix: impl Into<String>, redis: RedisConfig) -> Self {
        CacheConfig {
            prefix: prefix.into(),
            backend: BackendConfig::Redis(redis),
        }
    }

    /// Read settings from the process environment.
    ///
    /// | Variable          | Meaning                         | Default     |
    /// |-------------------|---------------------------------|-------------|
    /// | `CACHE_PREFIX`    | key prefix                      | empty       |
    /// | `CACHE_BACKEND`   | `inmemory` or `redis`           | `inmemory`  |
    /// | `REDIS_HOST`      | Redis host                      | `localhost` |
    /// | `REDIS_PORT`      | Redis port                      | `6379`      |
    /// | `REDIS_USERNAME`  | ACL user                        | none        |
    /// | `REDIS_PASSWORD`  | password                        | none        |
    /// | `REDIS_DB`        | database index                  | `0`         |
    /// | `REDIS_POOL_SIZE` | connection pool size            | `16`        |
    ///
    /// # Errors
    ///
    /// - `Error::ConfigError`: unknown backend or unparsable number
    /// - `Error::NotImplemented`: `redis` requested without the `redis` feature
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = lookup("CACHE_PREFIX").unwrap_or_default();
        let kind = lookup("CACHE_BACKEND").unwrap_or_else(|| "inmemory".to_string());

        let backend = match kind.trim().to_ascii_lowercase().as_str() {
            "inmemory" | "memory" => BackendConfig::InMemory,
            "redis" => redis_from_lookup(&lookup)?,
            other => {
                return Err(Error::ConfigError(format!(
                    "unknown CACHE_BACKEND {:?} (expected inmemory or redis)",
                    other
                )))
            }
        };

        Ok(CacheConfig { prefix, backend })
    }
}

#[cfg(feature = "redis")]
fn redis_from_lookup<F>(lookup: &F) -> Result<BackendConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = RedisConfig::default();
    Ok(BackendConfig::Redis(RedisConfig {
        host: lookup("REDIS_HOST").unwrap_or(defaults.host),
        port: parse_var(lookup, "REDIS_PORT")?.unwrap_or(defaults.port),
        username: lookup("REDIS_USERNAME"),
        password: lookup("REDIS_PASSWORD"),
        database: parse_var(lookup, "REDIS_DB")?.unwrap_or(defaults.database),
        pool_size: parse_var(lookup, "REDIS_POOL_SIZE")?.unwrap_or(defaults.pool_size),
        connection_timeout: defaults.connection_timeout,
    }))
}

#[cfg(not(feature = "redis"))]
fn redis_from_lookup<F>(_lookup: &F) -> Result<BackendConfig>
where
    F: Fn(&str) -> Option<String>,
{
    Err(Error::NotImplemented(
        "redis backend requires the \"redis\" feature".to_string(),
    ))
}

#[cfg_attr(not(feature = "redis"), allow(dead_code))]
fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::ConfigError(format!("invalid {} {:?}: {}", name, raw, e)))
        })
        .transpose()
}

impl Cache<Backend> {
    /// Build a cache from settings.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the Redis pool cannot be created.
    pub async fn from_config(config: CacheConfig) -> Result<Self> {
        let backend = match config.backend {
            BackendConfig::InMemory => Backend::from(InMemoryBackend::new()),
            #[cfg(feature = "redis")]
            BackendConfig::Redis(redis) => Backend::from(RedisStore::new(redis).await?),
        };

        info!(
            "✓ Cache initialized (backend: {}, prefix: {:?})",
            backend.kind(),
            config.prefix
        );

        Ok(Cache::new(backend, config.prefix))
    }
}
