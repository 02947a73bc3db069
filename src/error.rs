//! Error types for typed cache operations.

use crate::value::Family;
use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for typed cache operations.
///
/// A cache miss is never an error: reads report it as `Ok(None)`. Every variant below is a
/// genuine failure and is returned to the caller as-is; nothing is retried internally.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A value was read through a different family than it was written with.
    ///
    /// Example: `set::<i64>("k", ..)` followed by `get::<Vec<u8>>("k")`.
    /// The stored entry is left untouched.
    TypeMismatch {
        /// Caller-facing key (before namespacing)
        key: String,
        /// Family requested by the read
        expected: Family,
        /// Family actually stored under the key
        found: Family,
    },

    /// Serialization failed when converting a payload to cache bytes.
    ///
    /// Common causes:
    /// - `serde_json` could not encode a value handed to `set_json`
    /// - Postcard codec error
    SerializationError(String),

    /// Deserialization failed when converting cache bytes or JSON back into a value.
    ///
    /// This indicates corrupted data, or a JSON document that does not fit the
    /// requested Rust type.
    DeserializationError(String),

    /// Backend storage error (Redis connection, pool, protocol).
    ///
    /// **Recovery:** owned by the caller; the cache never retries.
    BackendError(String),

    /// Configuration error while building a cache from settings.
    ConfigError(String),

    /// Feature not compiled in.
    ///
    /// Returned when configuration asks for a backend whose Cargo feature is disabled.
    NotImplemented(String),

    /// Invalid cache entry: bad magic or an undecodable envelope.
    ///
    /// Usually means the key holds data that was not written by this crate.
    InvalidCacheEntry(String),

    /// Envelope schema version differs from the one compiled into this crate.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch {
                key,
                expected,
                found,
            } => write!(
                f,
                "Type mismatch for key {}: expected {}, found {}",
                key, expected, found
            ),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::InvalidCacheEntry(msg) => {
                write!(f, "Invalid cache entry: {}", msg)
            }
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// True for failures coming from the storage layer rather than from the caller's data.
    pub fn is_backend(&self) -> bool {
        matches!(self, Error::BackendError(_))
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        match e {
            postcard::Error::SerializeBufferFull
            | postcard::Error::SerializeSeqLengthUnknown
            | postcard::Error::SerdeSerCustom => Error::SerializationError(e.to_string()),
            _ => Error::DeserializationError(e.to_string()),
        }
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::BackendError("connection refused".to_string());
        assert_eq!(err.to_string(), "Backend error: connection refused");
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = Error::TypeMismatch {
            key: "visits".to_string(),
            expected: Family::Bytes,
            found: Family::Int64,
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch for key visits: expected bytes, found int64"
        );
        assert!(!err.is_backend());
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn test_error_from_json_syntax() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json")
            .expect_err("invalid json must fail");
        let err: Error = json_err.into();
        assert!(matches!(err, Error::DeserializationError(_)));
    }
}
