//! Cache Module
//!
//! Expiration-aware cache over a persistent key-value store, with an
//! observable in-memory mirror.

pub mod clock;
pub mod codec;
mod collection;
mod engine;
mod entry;
mod mirror;
mod stats;
pub mod storage;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::CollectionStore;
pub use engine::CacheEngine;
pub use entry::{CacheEntry, LogicalKey, StoredKey, DEFAULT_METHOD};
pub use mirror::{CacheMirror, MirrorSnapshot};
pub use stats::{CacheStats, StatsCounter};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
