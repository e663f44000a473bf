//! Collection Store
//!
//! Reads, overwrites and deletes whole named collections in the key-value
//! primitive. Every save rewrites the full collection, so a write costs
//! O(collection size).

use std::sync::Arc;

use tracing::trace;

use crate::cache::codec::{decode_collection, encode_collection};
use crate::cache::entry::CacheEntry;
use crate::cache::storage::KeyValueStore;
use crate::error::Result;

/// Adapter between collections of entries and the raw string store.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl CollectionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Loads a collection, empty if it was never written.
    ///
    /// Stored text that does not decode as a pair list is an error.
    pub fn load(&self, collection: &str) -> Result<Vec<CacheEntry>> {
        match self.storage.get_item(collection)? {
            Some(raw) => decode_collection(collection, &raw),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces the collection's stored value with `entries`.
    pub fn save(&self, collection: &str, entries: &[CacheEntry]) -> Result<()> {
        let raw = encode_collection(collection, entries)?;
        trace!(collection, entries = entries.len(), bytes = raw.len(), "saving collection");
        self.storage.set_item(collection, &raw)
    }

    /// Deletes the whole collection.
    pub fn remove(&self, collection: &str) -> Result<()> {
        trace!(collection, "removing collection");
        self.storage.remove_item(collection)
    }

    /// Saves `entries`, or removes the collection when there are none left.
    pub fn save_or_remove(&self, collection: &str, entries: &[CacheEntry]) -> Result<()> {
        if entries.is_empty() {
            self.remove(collection)
        } else {
            self.save(collection, entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::StoredKey;
    use crate::cache::storage::MemoryStorage;
    use crate::error::CacheError;
    use serde_json::json;

    fn setup() -> (Arc<MemoryStorage>, CollectionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = CollectionStore::new(storage.clone());
        (storage, store)
    }

    fn entry(key: &str, value: serde_json::Value) -> CacheEntry {
        CacheEntry::new(StoredKey::from_raw(key), value)
    }

    #[test]
    fn test_load_absent_is_empty() {
        let (_, store) = setup();
        assert!(store.load("nothing here").unwrap().is_empty());
    }

    #[test]
    fn test_save_overwrites_whole_collection() {
        let (storage, store) = setup();

        store.save("c", &[entry("a", json!(1)), entry("b", json!(2))]).unwrap();
        store.save("c", &[entry("c", json!(3))]).unwrap();

        assert_eq!(store.load("c").unwrap(), vec![entry("c", json!(3))]);
        assert_eq!(storage.raw("c"), Some(r#"[["c",3]]"#.to_string()));
    }

    #[test]
    fn test_load_malformed_fails() {
        let (storage, store) = setup();
        storage.set_item("c", "{{{ definitely not json").unwrap();

        assert!(matches!(store.load("c"), Err(CacheError::StoreRead { .. })));
    }

    #[test]
    fn test_save_or_remove_drops_empty_collection() {
        let (storage, store) = setup();

        store.save("c", &[entry("a", json!(1))]).unwrap();
        store.save_or_remove("c", &[]).unwrap();

        assert_eq!(storage.raw("c"), None);
    }

    #[test]
    fn test_collections_are_independent() {
        let (_, store) = setup();

        store.save("one", &[entry("a", json!(1))]).unwrap();
        store.save("two", &[entry("b", json!(2))]).unwrap();
        store.remove("one").unwrap();

        assert!(store.load("one").unwrap().is_empty());
        assert_eq!(store.load("two").unwrap().len(), 1);
    }
}
