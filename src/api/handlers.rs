//! API Handlers
//!
//! HTTP request handlers for each query cache endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use crate::cache::{CacheEngine, FileStorage, KeyValueStore, MemoryStorage, MirrorSnapshot};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, HealthResponse, InvalidateResponse, QueryBody, QueryResponse, StatsResponse,
};
use crate::query::{HttpFetcher, QueryClient, QueryOptions, QueryState};

/// Application state shared across all handlers.
///
/// The query client sits behind a mutex, so API calls are sequenced and
/// refetch/invalidate act on the last request any caller issued.
#[derive(Clone)]
pub struct AppState {
    /// Query orchestrator
    pub client: Arc<Mutex<QueryClient>>,
    /// Engine shared with the client, for cache-level endpoints
    pub engine: CacheEngine,
}

impl AppState {
    /// Creates a new AppState around the given query client.
    pub fn new(client: QueryClient) -> Self {
        let engine = client.engine().clone();
        Self {
            client: Arc::new(Mutex::new(client)),
            engine,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens file storage when a storage directory is configured, in-memory
    /// storage otherwise, and an HTTP fetcher against the upstream.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage: Arc<dyn KeyValueStore> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStorage::open(dir)?),
            None => Arc::new(MemoryStorage::new()),
        };
        let engine = CacheEngine::new(storage);

        let mut fetcher = HttpFetcher::new(Duration::from_secs(config.fetch_timeout))?;
        if let Some(base_url) = &config.upstream_base_url {
            fetcher = fetcher.with_base_url(base_url);
        }

        let options = QueryOptions::from_config(config);
        let client = QueryClient::new(engine, Arc::new(fetcher), options);
        info!(
            "Query client ready: collection='{}', ttl={}s",
            config.collection_key, config.default_ttl
        );
        Ok(Self::new(client))
    }
}

/// Turns the outcome of a query into a response, surfacing the stored error.
fn query_outcome(data: Option<Value>, state: QueryState) -> Result<Json<QueryResponse>> {
    if let Some(error) = state.error {
        return Err(error);
    }

    match (data, state.source) {
        (Some(data), Some(source)) => Ok(Json(QueryResponse::new(data, source))),
        _ => Err(CacheError::Internal("query produced no result".to_string())),
    }
}

/// Handler for POST /query
///
/// Answers from cache when fresh, otherwise fetches upstream and caches the result.
pub async fn query_handler(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Result<Json<QueryResponse>> {
    // Validate request
    if let Some(error_msg) = body.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut client = state.client.lock().await;
    let data = client.query(body.into_request()).await;
    query_outcome(data, client.state())
}

/// Handler for POST /refetch
///
/// Invalidates and re-issues the last query.
pub async fn refetch_handler(State(state): State<AppState>) -> Result<Json<QueryResponse>> {
    let mut client = state.client.lock().await;
    if client.last_request().is_none() {
        return Err(CacheError::NoPriorRequest);
    }

    // Any query run by refetch publishes state; no change means it was skipped
    let updates = client.subscribe();
    let data = client.refetch().await;
    if !updates.has_changed().unwrap_or(false) {
        return Err(CacheError::Internal(format!(
            "invalidation failed in '{}', refetch skipped",
            client.options().collection
        )));
    }

    query_outcome(data, client.state())
}

/// Handler for POST /invalidate
///
/// Evicts the cached answer to the last query.
pub async fn invalidate_handler(
    State(state): State<AppState>,
) -> Result<Json<InvalidateResponse>> {
    let client = state.client.lock().await;
    let key = client
        .last_request()
        .map(|request| request.logical_key().to_string())
        .ok_or(CacheError::NoPriorRequest)?;
    let invalidated = client.invalidate().ok_or(CacheError::NoPriorRequest)?;

    Ok(Json(InvalidateResponse::new(invalidated, key)))
}

/// Handler for GET /cache
///
/// Returns the current mirror snapshot.
pub async fn cache_handler(State(state): State<AppState>) -> Json<MirrorSnapshot> {
    Json(MirrorSnapshot::clone(&state.engine.mirror().snapshot()))
}

/// Handler for DELETE /cache/:collection
///
/// Removes a whole collection.
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<ClearResponse>> {
    state.engine.clear(&collection)?;
    Ok(Json(ClearResponse::new(collection)))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.engine.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
