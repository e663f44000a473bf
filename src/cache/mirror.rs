//! Cache Mirror
//!
//! Observable in-memory copy of cache contents. Not consulted for expiry;
//! the persistent collections stay authoritative.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::cache::entry::StoredKey;

/// An immutable view of the mirror at one version.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MirrorSnapshot {
    /// Bumped once per published change
    pub version: u64,
    /// collection -> stored key -> value
    pub collections: BTreeMap<String, BTreeMap<String, Value>>,
}

impl MirrorSnapshot {
    pub fn get(&self, collection: &str, key: &StoredKey) -> Option<&Value> {
        self.collections.get(collection)?.get(key.as_str())
    }

    /// Value for the first stored key in `collection` whose logical part is `logical`.
    pub fn find_logical(&self, collection: &str, logical: &str) -> Option<&Value> {
        self.collections
            .get(collection)?
            .iter()
            .find(|(key, _)| StoredKey::from_raw(key.as_str()).logical() == logical)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Cache Mirror ==
/// Shared handle to the mirror. Clones observe and publish the same state.
///
/// Updates never touch a published snapshot: each one builds the next
/// snapshot and swaps it in, so readers holding an `Arc` keep a stable view.
#[derive(Debug, Clone)]
pub struct CacheMirror {
    tx: Arc<watch::Sender<Arc<MirrorSnapshot>>>,
}

impl Default for CacheMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheMirror {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(MirrorSnapshot::default()));
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<MirrorSnapshot> {
        self.tx.borrow().clone()
    }

    /// Receiver notified after every published change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<MirrorSnapshot>> {
        self.tx.subscribe()
    }

    /// Records `value` under `key`, dropping any other key with the same logical part.
    pub(crate) fn record(&self, collection: &str, key: &StoredKey, value: &Value) {
        self.publish(|next| {
            let entries = next.collections.entry(collection.to_string()).or_default();
            entries.retain(|existing, _| {
                StoredKey::from_raw(existing.as_str()).logical() != key.logical()
            });
            entries.insert(key.as_str().to_string(), value.clone());
        });
    }

    pub(crate) fn forget(&self, collection: &str, key: &StoredKey) {
        self.publish(|next| {
            if let Some(entries) = next.collections.get_mut(collection) {
                entries.remove(key.as_str());
                if entries.is_empty() {
                    next.collections.remove(collection);
                }
            }
        });
    }

    pub(crate) fn forget_collection(&self, collection: &str) {
        self.publish(|next| {
            next.collections.remove(collection);
        });
    }

    fn publish(&self, change: impl FnOnce(&mut MirrorSnapshot)) {
        self.tx.send_modify(|current| {
            let mut next = (**current).clone();
            change(&mut next);
            next.version = current.version + 1;
            *current = Arc::new(next);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(raw: &str) -> StoredKey {
        StoredKey::from_raw(raw)
    }

    #[test]
    fn test_record_and_forget() {
        let mirror = CacheMirror::new();
        let k = key("endpoint=/a&method=GET&expiration=10");

        mirror.record("c", &k, &json!(1));
        assert_eq!(mirror.snapshot().get("c", &k), Some(&json!(1)));
        assert_eq!(mirror.snapshot().version, 1);

        mirror.forget("c", &k);
        let snapshot = mirror.snapshot();
        assert!(snapshot.is_empty());
        assert!(!snapshot.collections.contains_key("c"));
        assert_eq!(snapshot.version, 2);
    }

    #[test]
    fn test_record_replaces_same_logical_key() {
        let mirror = CacheMirror::new();

        mirror.record("c", &key("endpoint=/a&method=GET&expiration=10"), &json!("old"));
        mirror.record("c", &key("endpoint=/a&method=GET&expiration=20"), &json!("new"));

        let snapshot = mirror.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.find_logical("c", "endpoint=/a&method=GET"),
            Some(&json!("new"))
        );
    }

    #[test]
    fn test_published_snapshots_are_not_mutated() {
        let mirror = CacheMirror::new();
        let k = key("endpoint=/a&method=GET&expiration=10");

        mirror.record("c", &k, &json!(1));
        let before = mirror.snapshot();

        mirror.record("c", &k, &json!(2));
        mirror.forget_collection("c");

        assert_eq!(before.get("c", &k), Some(&json!(1)));
        assert_eq!(before.version, 1);
        assert_eq!(mirror.snapshot().version, 3);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let mirror = CacheMirror::new();
        let mut rx = mirror.subscribe();

        mirror.record("c", &key("k&expiration=1"), &json!(true));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().version, 1);
    }

    #[test]
    fn test_clones_share_state() {
        let mirror = CacheMirror::new();
        let other = mirror.clone();

        other.record("c", &key("k"), &json!(1));
        assert_eq!(mirror.snapshot().len(), 1);
    }
}
