//! Cache Engine
//!
//! Lookup with lazy expiry, insert with TTL and invalidation, each scoped to
//! one named collection of the persistent store. The mirror is updated on
//! every write path so observers never need to re-read storage.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::codec::encode_key;
use crate::cache::collection::CollectionStore;
use crate::cache::entry::{CacheEntry, LogicalKey, StoredKey};
use crate::cache::mirror::CacheMirror;
use crate::cache::stats::{CacheStats, StatsCounter};
use crate::cache::storage::KeyValueStore;
use crate::error::Result;

// == Cache Engine ==
/// Expiration-aware cache over a [`KeyValueStore`].
///
/// Cloning is cheap and clones share storage, mirror, clock and counters.
/// There is no locking across a read-modify-write: two concurrent writers to
/// the same collection race and the last full-collection save wins.
#[derive(Debug, Clone)]
pub struct CacheEngine {
    collections: CollectionStore,
    mirror: CacheMirror,
    clock: Arc<dyn Clock>,
    stats: Arc<StatsCounter>,
}

impl CacheEngine {
    // == Constructor ==
    /// Creates an engine on the wall clock with a fresh mirror.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Creates an engine that reads time from `clock`.
    pub fn with_clock(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: CollectionStore::new(storage),
            mirror: CacheMirror::new(),
            clock,
            stats: Arc::new(StatsCounter::new()),
        }
    }

    /// Publishes into an existing mirror instead of a private one.
    pub fn with_mirror(mut self, mirror: CacheMirror) -> Self {
        self.mirror = mirror;
        self
    }

    // == Lookup ==
    /// Returns the fresh value cached for `key`, or `None` on a miss.
    ///
    /// Only the first entry whose logical part equals `key` is considered. If
    /// that entry has expired it is evicted before reporting the miss.
    pub fn lookup(&self, key: &LogicalKey, collection: &str) -> Result<Option<Value>> {
        let entries = self.collections.load(collection)?;

        let Some(found) = entries.iter().find(|entry| entry.key.matches(key)) else {
            debug!("Cache miss: {} in '{}'", key, collection);
            self.stats.record_miss();
            return Ok(None);
        };

        if found.key.is_expired_at(self.clock.now_ms()) {
            let stale = found.key.clone();
            debug!("Cache entry expired: {} in '{}'", stale, collection);
            self.evict(collection, entries, &stale)?;
            self.stats.record_miss();
            return Ok(None);
        }

        debug!("Cache hit: {} in '{}'", key, collection);
        self.stats.record_hit();
        self.mirror.record(collection, &found.key, &found.value);
        Ok(Some(found.value.clone()))
    }

    // == Insert ==
    /// Stores `value` for `key` with an expiration `ttl_secs` from now.
    ///
    /// Any entry already held for the same logical key is dropped first, so a
    /// collection never carries two stamps for one request.
    pub fn insert(
        &self,
        key: &LogicalKey,
        value: Value,
        collection: &str,
        ttl_secs: u64,
    ) -> Result<StoredKey> {
        let mut entries = self.collections.load(collection)?;

        let before = entries.len();
        entries.retain(|entry| !entry.key.matches(key));
        let replaced = before - entries.len();

        let stored = encode_key(key, ttl_secs, self.clock.now_ms());
        entries.push(CacheEntry::new(stored.clone(), value));
        self.collections.save(collection, &entries)?;

        self.stats.record_evictions(replaced);
        self.stats.record_insert();
        if let Some(inserted) = entries.last() {
            self.mirror.record(collection, &inserted.key, &inserted.value);
        }

        debug!(
            "Cached {} in '{}' for {}s (replaced {})",
            key, collection, ttl_secs, replaced
        );
        Ok(stored)
    }

    // == Invalidate ==
    /// Evicts the entry held for `key`, if any.
    ///
    /// Returns `true` when the collection no longer holds `key`, including when
    /// it never did (the store is left untouched then). Storage failures are
    /// logged and reported as `false`.
    pub fn invalidate(&self, key: &LogicalKey, collection: &str) -> bool {
        match self.try_invalidate(key, collection) {
            Ok(removed) => {
                debug!(
                    "Invalidated {} in '{}' (entry present: {})",
                    key, collection, removed
                );
                true
            }
            Err(e) => {
                warn!("Failed to invalidate {} in '{}': {}", key, collection, e);
                false
            }
        }
    }

    fn try_invalidate(&self, key: &LogicalKey, collection: &str) -> Result<bool> {
        let entries = self.collections.load(collection)?;

        let Some(target) = entries
            .iter()
            .find(|entry| entry.key.matches(key))
            .map(|entry| entry.key.clone())
        else {
            return Ok(false);
        };

        self.evict(collection, entries, &target)?;
        Ok(true)
    }

    // == Purge Expired ==
    /// Removes every expired entry of `collection` in a single write.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self, collection: &str) -> Result<usize> {
        let now = self.clock.now_ms();
        let (expired, fresh): (Vec<CacheEntry>, Vec<CacheEntry>) = self
            .collections
            .load(collection)?
            .into_iter()
            .partition(|entry| entry.key.is_expired_at(now));

        if expired.is_empty() {
            return Ok(0);
        }

        self.collections.save_or_remove(collection, &fresh)?;
        for entry in &expired {
            self.mirror.forget(collection, &entry.key);
        }
        self.stats.record_evictions(expired.len());
        Ok(expired.len())
    }

    // == Clear ==
    /// Drops a whole collection from storage and mirror.
    pub fn clear(&self, collection: &str) -> Result<()> {
        self.collections.remove(collection)?;
        self.mirror.forget_collection(collection);
        debug!("Cleared collection '{}'", collection);
        Ok(())
    }

    /// Entries currently persisted for `collection`, expired ones included.
    pub fn entries(&self, collection: &str) -> Result<Vec<CacheEntry>> {
        self.collections.load(collection)
    }

    pub fn mirror(&self) -> &CacheMirror {
        &self.mirror
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Removes `key` from `entries`, persists the rest (or drops the emptied
    /// collection) and forgets it in the mirror.
    fn evict(
        &self,
        collection: &str,
        mut entries: Vec<CacheEntry>,
        key: &StoredKey,
    ) -> Result<usize> {
        let before = entries.len();
        entries.retain(|entry| &entry.key != key);
        let removed = before - entries.len();

        self.collections.save_or_remove(collection, &entries)?;
        self.mirror.forget(collection, key);
        self.stats.record_evictions(removed);
        Ok(removed)
    }
}
