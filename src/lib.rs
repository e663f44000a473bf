//! Query Cache - A dual-layer expiring cache for HTTP query results
//!
//! Persists upstream answers in named collections with absolute expiry
//! timestamps encoded in the stored keys, and mirrors them into an observable
//! in-memory snapshot. A query client answers from cache when fresh and
//! falls back to the network otherwise.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEngine, CacheMirror, LogicalKey, StoredKey};
pub use config::Config;
pub use error::{CacheError, Result};
pub use query::{QueryClient, QueryOptions, QueryRequest, QueryState};
pub use tasks::spawn_sweep_task;
