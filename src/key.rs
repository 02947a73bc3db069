//! Cache key namespacing.

use std::borrow::Cow;
use std::sync::Arc;

/// Separator between a namespace prefix and the caller's key.
pub const SEPARATOR: char = ':';

/// Fixed key prefix for one cache instance.
///
/// Every operation rewrites the caller key through [`Namespace::key`] before touching
/// storage, so two caches with different prefixes can share one backend without
/// observing each other's entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespace {
    prefix: Arc<str>,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Namespace {
            prefix: Arc::from(prefix.into()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Effective storage key: `prefix:key`, or `key` unchanged when the prefix is empty.
    pub fn key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        if self.prefix.is_empty() {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(format!("{}{}{}", self.prefix, SEPARATOR, key))
        }
    }
}
