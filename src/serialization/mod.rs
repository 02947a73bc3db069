//! Postcard-based payload serialization with versioned envelopes.
//!
//! Used by the remote backend to turn a typed [`Payload`] into the opaque bytes a
//! key-value store keeps, and back.
//!
//! # Format
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │ POSTCARD WirePayload (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────────┘
//!   "TYPC"              u32                family tag + value
//! ```
//!
//! The family tag travels with the value, so a remote read through the wrong family is
//! reported as a type mismatch exactly like it is in-process. The `Any` family is carried
//! as `serde_json` bytes inside the envelope: postcard is not self-describing, JSON is, and
//! every JSON-representable value survives the round trip.
//!
//! # Example
//!
//! ```rust
//! use typed_cache::serialization::{decode_payload, encode_payload};
//! use typed_cache::value::Payload;
//! use serde_json::json;
//!
//! # fn main() -> typed_cache::Result<()> {
//! let payload = Payload::Any(json!({"name": "Alice", "tags": ["a", "b"], "extra": null}));
//! let bytes = encode_payload(payload.clone())?;
//! assert_eq!(decode_payload(&bytes)?, payload);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::value::Payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Magic header for typed-cache entries: b"TYPC"
pub const CACHE_MAGIC: [u8; 4] = *b"TYPC";

/// Current envelope schema version.
///
/// Bump when [`WirePayload`] changes shape. Entries written with another version are
/// rejected with [`Error::VersionMismatch`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope around every stored value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    /// Magic header: must be b"TYPC"
    pub magic: [u8; 4],
    /// Schema version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Storage form of a [`Payload`].
///
/// Variant order is part of the format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum WirePayload {
    Int64(i64),
    Int(i64),
    Time(DateTime<Utc>),
    Bytes(Vec<u8>),
    Str(String),
    /// `serde_json` encoding of the value
    Json(Vec<u8>),
}

impl TryFrom<Payload> for WirePayload {
    type Error = Error;

    fn try_from(payload: Payload) -> Result<Self> {
        Ok(match payload {
            Payload::Int64(v) => WirePayload::Int64(v),
            Payload::Int(v) => WirePayload::Int(v as i64),
            Payload::Time(v) => WirePayload::Time(v),
            Payload::Bytes(v) => WirePayload::Bytes(v),
            Payload::Str(v) => WirePayload::Str(v),
            Payload::Any(v) => WirePayload::Json(
                serde_json::to_vec(&v).map_err(|e| Error::SerializationError(e.to_string()))?,
            ),
        })
    }
}

impl TryFrom<WirePayload> for Payload {
    type Error = Error;

    fn try_from(wire: WirePayload) -> Result<Self> {
        Ok(match wire {
            WirePayload::Int64(v) => Payload::Int64(v),
            WirePayload::Int(v) => Payload::Int(isize::try_from(v).map_err(|_| {
                Error::DeserializationError(format!("int value {} overflows isize", v))
            })?),
            WirePayload::Time(v) => Payload::Time(v),
            WirePayload::Bytes(v) => Payload::Bytes(v),
            WirePayload::Str(v) => Payload::Str(v),
            WirePayload::Json(bytes) => Payload::Any(serde_json::from_slice(&bytes)?),
        })
    }
}

/// Serialize a payload with envelope for remote storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if JSON or Postcard encoding fails.
pub fn encode_payload(payload: Payload) -> Result<Vec<u8>> {
    let envelope = CacheEnvelope::new(WirePayload::try_from(payload)?);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Deserialize a payload from remote storage with validation.
///
/// Checks, in order: the envelope decodes, the magic matches, the version matches, the
/// inner value converts back to a [`Payload`].
///
/// # Errors
///
/// - `Error::DeserializationError`: undecodable envelope or inner value
/// - `Error::InvalidCacheEntry`: invalid magic header
/// - `Error::VersionMismatch`: schema version mismatch
pub fn decode_payload(bytes: &[u8]) -> Result<Payload> {
    let envelope: CacheEnvelope<WirePayload> = postcard::from_bytes(bytes).map_err(|e| {
        error!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != CACHE_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Payload::try_from(envelope.payload)
}
