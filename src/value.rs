//! Value families and the tagged payload stored by every backend.
//!
//! A cache entry never holds an untyped blob: it holds a [`Payload`], which remembers the
//! family it was written with. Reads go through [`CacheValue::from_payload`], so asking
//! for an `i64` where bytes were stored is detected and reported as
//! [`Error::TypeMismatch`](crate::Error::TypeMismatch) instead of being reinterpreted.
//!
//! | Family  | Rust type              |
//! |---------|------------------------|
//! | `Int64` | `i64`                  |
//! | `Int`   | `isize`                |
//! | `Time`  | `chrono::DateTime<Utc>`|
//! | `Bytes` | `Vec<u8>`              |
//! | `Str`   | `String`               |
//! | `Any`   | `serde_json::Value`    |

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

/// The value family a payload belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Int64,
    Int,
    Time,
    Bytes,
    Str,
    Any,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Int64 => "int64",
            Family::Int => "int",
            Family::Time => "time",
            Family::Bytes => "bytes",
            Family::Str => "string",
            Family::Any => "any",
        };
        f.write_str(name)
    }
}

/// A typed value as held by a backend.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Int64(i64),
    Int(isize),
    Time(DateTime<Utc>),
    Bytes(Vec<u8>),
    Str(String),
    Any(Value),
}

impl Payload {
    /// Family tag of this payload.
    pub fn family(&self) -> Family {
        match self {
            Payload::Int64(_) => Family::Int64,
            Payload::Int(_) => Family::Int,
            Payload::Time(_) => Family::Time,
            Payload::Bytes(_) => Family::Bytes,
            Payload::Str(_) => Family::Str,
            Payload::Any(_) => Family::Any,
        }
    }

    /// Approximate in-memory footprint of the value, used for statistics.
    pub fn size_hint(&self) -> usize {
        match self {
            Payload::Int64(_) | Payload::Int(_) => 8,
            Payload::Time(_) => 12,
            Payload::Bytes(b) => b.len(),
            Payload::Str(s) => s.len(),
            Payload::Any(v) => v.to_string().len(),
        }
    }
}

/// Rust types that can be stored in the cache.
///
/// Implemented for one Rust type per [`Family`]. Arbitrary serde types go through the
/// `Any` family with [`Cache::set_json`](crate::Cache::set_json) and friends.
pub trait CacheValue: Clone + Send + Sync + Sized + 'static {
    /// Family this type is stored as.
    const FAMILY: Family;

    /// Wrap the value into a tagged payload.
    fn into_payload(self) -> Payload;

    /// Unwrap a payload, giving it back if it belongs to another family.
    fn from_payload(payload: Payload) -> std::result::Result<Self, Payload>;
}

macro_rules! impl_cache_value {
    ($ty:ty, $variant:ident) => {
        impl CacheValue for $ty {
            const FAMILY: Family = Family::$variant;

            fn into_payload(self) -> Payload {
                Payload::$variant(self)
            }

            fn from_payload(payload: Payload) -> std::result::Result<Self, Payload> {
                match payload {
                    Payload::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
}

impl_cache_value!(i64, Int64);
impl_cache_value!(isize, Int);
impl_cache_value!(DateTime<Utc>, Time);
impl_cache_value!(Vec<u8>, Bytes);
impl_cache_value!(String, Str);
impl_cache_value!(Value, Any);
