//! Query Client
//!
//! Request lifecycle on top of the cache engine: look up, fall back to the
//! network, populate the cache, and publish loading/data/error state.
//! Failures end up in [`QueryState::error`]; none of the public operations
//! return an error.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::CacheEngine;
use crate::config::{Config, DEFAULT_COLLECTION, DEFAULT_TTL_SECS};
use crate::error::{CacheError, Result};
use crate::query::{Fetcher, QueryRequest};

/// Where the last successful answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Network,
}

/// Observable state of a [`QueryClient`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    /// A query is in flight
    pub loading: bool,
    /// Payload of the last query, `None` when it failed
    pub data: Option<Value>,
    /// Failure of the last query, cleared when a new one starts
    pub error: Option<CacheError>,
    /// Origin of `data`
    pub source: Option<Source>,
}

/// Per call-site cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub collection: String,
    pub ttl_secs: u64,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl QueryOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            collection: config.collection_key.clone(),
            ttl_secs: config.default_ttl,
        }
    }
}

// == Query Client ==
/// Answers requests from cache when fresh, from the fetcher otherwise.
///
/// Remembers the most recent request so it can be invalidated or refetched.
/// Concurrent misses for the same key are not coalesced.
pub struct QueryClient {
    engine: CacheEngine,
    fetcher: Arc<dyn Fetcher>,
    options: QueryOptions,
    last_request: Option<QueryRequest>,
    state: watch::Sender<QueryState>,
}

impl QueryClient {
    pub fn new(engine: CacheEngine, fetcher: Arc<dyn Fetcher>, options: QueryOptions) -> Self {
        let (state, _rx) = watch::channel(QueryState::default());
        Self {
            engine,
            fetcher,
            options,
            last_request: None,
            state,
        }
    }

    // == Query ==
    /// Resolves `request` and remembers it for [`refetch`](Self::refetch) and
    /// [`invalidate`](Self::invalidate).
    ///
    /// Returns `None` on any failure; the cause is left in the state.
    pub async fn query(&mut self, request: QueryRequest) -> Option<Value> {
        self.last_request = Some(request.clone());

        let _loading = LoadingGuard::start(&self.state);
        match self.resolve(&request).await {
            Ok((value, source)) => {
                self.state.send_modify(|state| {
                    state.data = Some(value.clone());
                    state.source = Some(source);
                });
                Some(value)
            }
            Err(e) => {
                warn!("Query {} {} failed: {}", request.method, request.url, e);
                self.state.send_modify(|state| {
                    state.data = None;
                    state.source = None;
                    state.error = Some(e);
                });
                None
            }
        }
    }

    /// [`query`](Self::query), deserialized into the caller's type.
    ///
    /// A payload of the wrong shape is reported as a malformed response.
    pub async fn query_as<T: DeserializeOwned>(&mut self, request: QueryRequest) -> Option<T> {
        let value = self.query(request).await?;

        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                let error = CacheError::MalformedResponse(e.to_string());
                warn!("Query payload has unexpected shape: {}", error);
                self.state.send_modify(|state| state.error = Some(error));
                None
            }
        }
    }

    // == Refetch ==
    /// Invalidates the last request and queries it again.
    ///
    /// No-op returning `None` when nothing was queried yet or the
    /// invalidation failed.
    pub async fn refetch(&mut self) -> Option<Value> {
        let Some(request) = self.last_request.clone() else {
            debug!("Refetch requested before any query");
            return None;
        };

        if !self
            .engine
            .invalidate(&request.logical_key(), &self.options.collection)
        {
            return None;
        }

        self.query(request).await
    }

    // == Invalidate ==
    /// Evicts the cached answer to the last request.
    ///
    /// `None` when nothing was queried yet.
    pub fn invalidate(&self) -> Option<bool> {
        let request = self.last_request.as_ref()?;
        Some(
            self.engine
                .invalidate(&request.logical_key(), &self.options.collection),
        )
    }

    // == Accessors ==
    pub fn state(&self) -> QueryState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change, including `loading` flips.
    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state.subscribe()
    }

    pub fn last_request(&self) -> Option<&QueryRequest> {
        self.last_request.as_ref()
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn engine(&self) -> &CacheEngine {
        &self.engine
    }

    async fn resolve(&self, request: &QueryRequest) -> Result<(Value, Source)> {
        let key = request.logical_key();
        let collection = &self.options.collection;

        if let Some(value) = self.engine.lookup(&key, collection)? {
            return Ok((value, Source::Cache));
        }

        let response = self.fetcher.fetch(request).await?;
        if !response.is_ok() {
            return Err(CacheError::HttpStatus {
                status: response.status,
            });
        }

        let value: Value = response.data()?;
        self.engine
            .insert(&key, value.clone(), collection, self.options.ttl_secs)?;

        Ok((value, Source::Network))
    }
}

/// Raises `loading` and clears the previous error; drops `loading` again
/// however the query ends, including when its future is dropped.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<QueryState>,
}

impl<'a> LoadingGuard<'a> {
    fn start(state: &'a watch::Sender<QueryState>) -> Self {
        state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|state| state.loading = false);
    }
}
