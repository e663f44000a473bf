//! Cache Entry Module
//!
//! Key types and the (stored key, value) pair kept in a collection.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::codec;

/// HTTP method assumed when a request does not name one.
pub const DEFAULT_METHOD: &str = "GET";

// == Logical Key ==
/// Identity of a request: `endpoint=<url>&method=<METHOD>`.
///
/// Body and headers take no part, so two requests to the same URL with the
/// same method share one cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalKey(String);

impl LogicalKey {
    pub fn new(url: &str, method: &str) -> Self {
        let method = if method.trim().is_empty() {
            DEFAULT_METHOD.to_string()
        } else {
            method.trim().to_ascii_uppercase()
        };
        Self(format!("endpoint={}&method={}", url, method))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Stored Key ==
/// A logical key with its expiration stamp, as written to the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredKey(String);

impl StoredKey {
    /// Wraps an already encoded key. Use [`codec::encode_key`] to build one.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The logical key part (everything before the expiration separator).
    pub fn logical(&self) -> &str {
        codec::split_stored_key(&self.0).0
    }

    /// Whether this key belongs to `key`. Exact match on the logical part.
    pub fn matches(&self, key: &LogicalKey) -> bool {
        self.logical() == key.as_str()
    }

    /// Expiration in Unix milliseconds, `None` if absent or malformed.
    pub fn expiration(&self) -> Option<u64> {
        codec::parse_expiration(&self.0)
    }

    /// Expired strictly after the stamped instant. Malformed stamps never expire.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        matches!(self.expiration(), Some(expires_at) if now_ms > expires_at)
    }
}

impl fmt::Display for StoredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Cache Entry ==
/// One cached query result. Persisted as a `[key, value]` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(StoredKey, Value)", into = "(StoredKey, Value)")]
pub struct CacheEntry {
    pub key: StoredKey,
    pub value: Value,
}

impl CacheEntry {
    pub fn new(key: StoredKey, value: Value) -> Self {
        Self { key, value }
    }
}

impl From<(StoredKey, Value)> for CacheEntry {
    fn from((key, value): (StoredKey, Value)) -> Self {
        Self { key, value }
    }
}

impl From<CacheEntry> for (StoredKey, Value) {
    fn from(entry: CacheEntry) -> Self {
        (entry.key, entry.value)
    }
}
