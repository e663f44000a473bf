//! Entry Codec
//!
//! Translates between logical keys, expiration-stamped stored keys and the
//! string form a collection takes inside the persistent store.
//!
//! A stored key is the logical key followed by `&expiration=<unix ms>`. The
//! expiration lives only in the key. A collection is persisted as a JSON array
//! of `[stored_key, value]` pairs.

use crate::cache::entry::{CacheEntry, LogicalKey, StoredKey};
use crate::error::{CacheError, Result};

/// Literal that separates the logical key from the expiration timestamp.
pub const EXPIRATION_SEPARATOR: &str = "&expiration=";

// == Keys ==
/// Stamps `logical` with an expiration `ttl_secs` after `now_ms`.
pub fn encode_key(logical: &LogicalKey, ttl_secs: u64, now_ms: u64) -> StoredKey {
    let expires_at = now_ms.saturating_add(ttl_secs.saturating_mul(1000));
    StoredKey::from_raw(format!(
        "{}{}{}",
        logical.as_str(),
        EXPIRATION_SEPARATOR,
        expires_at
    ))
}

/// Splits a stored key into its logical part and the raw expiration text.
///
/// The stamp is always the last component, so the split happens at the last
/// separator. A key without the separator is all logical part.
pub fn split_stored_key(raw: &str) -> (&str, Option<&str>) {
    match raw.rsplit_once(EXPIRATION_SEPARATOR) {
        Some((logical, expiration)) => (logical, Some(expiration)),
        None => (raw, None),
    }
}

/// Reads the expiration timestamp out of a stored key.
///
/// `None` when the separator is missing or the timestamp is not a number.
/// Callers treat that as "never expires".
pub fn parse_expiration(raw: &str) -> Option<u64> {
    split_stored_key(raw)
        .1
        .and_then(|expiration| expiration.trim().parse::<u64>().ok())
}

// == Collections ==
/// Serializes a collection into the persistent-store string form.
pub fn encode_collection(collection: &str, entries: &[CacheEntry]) -> Result<String> {
    serde_json::to_string(entries).map_err(|e| CacheError::store_write(collection, e))
}

/// Parses a persisted collection. Anything that is not a pair list is an error.
pub fn decode_collection(collection: &str, raw: &str) -> Result<Vec<CacheEntry>> {
    serde_json::from_str(raw).map_err(|e| CacheError::store_read(collection, e))
}
