//! # typed-cache
//!
//! Typed cache-aside caching over interchangeable backends.
//!
//! ## Features
//!
//! - **Typed accessors:** `i64`, `isize`, `DateTime<Utc>`, `Vec<u8>`, `String` and JSON
//!   values, each stored with its family so a wrong-type read is an error, not garbage
//! - **TTL expiration:** per-write TTL, `NO_EXPIRATION` for values that never expire
//! - **Namespacing:** a fixed prefix per cache isolates caches sharing one backend
//! - **Cache-aside:** `get_or_compute` reads, and on a miss computes, stores and returns
//! - **Backend agnostic:** the same contract in-process and over Redis
//!
//! ## Quick Start
//!
//! ```
//! use typed_cache::{backend::InMemoryBackend, Cache};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> typed_cache::Result<()> {
//! let backend = InMemoryBackend::new();
//! let users = Cache::new(backend.clone(), "users");
//! let orders = Cache::new(backend, "orders");
//!
//! users.set("1", "Alice".to_string(), Duration::from_secs(300)).await?;
//! assert_eq!(orders.get::<String>("1").await?, None);
//!
//! let total = orders
//!     .get_or_compute("1:total", || async { (1999i64, Duration::from_secs(60)) })
//!     .await?;
//! assert_eq!(total, 1999);
//! # Ok(())
//! # }
//! ```
//!
//! ## Redis
//!
//! Enable the `redis` feature and build the cache on a [`backend::RedisStore`], or let
//! [`Cache::from_config`] pick the backend from [`CacheConfig`].

#[macro_use]
extern crate log;

pub mod backend;
pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod key;
pub mod observability;
pub mod serialization;
pub mod value;

// Re-exports for convenience
pub use backend::{Backend, CacheBackend};
pub use cache::{Cache, NO_EXPIRATION};
pub use config::{BackendConfig, CacheConfig};
pub use error::{Error, Result};
pub use value::{CacheValue, Family, Payload};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
