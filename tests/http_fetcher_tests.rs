//! Integration Tests for the HTTP Fetcher
//!
//! Runs a real upstream on a local port and drives the query client against it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use query_cache::{
    cache::{CacheEngine, MemoryStorage},
    query::{Fetcher, HttpFetcher, Source},
    CacheError, QueryClient, QueryOptions, QueryRequest,
};
use serde::Deserialize;
use serde_json::{json, Value};

// == Helper Functions ==

#[derive(Clone, Default)]
struct Upstream {
    hits: Arc<AtomicUsize>,
}

async fn users(State(upstream): State<Upstream>) -> Json<Value> {
    let n = upstream.hits.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "data": { "users": ["ada"], "served": n } }))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn not_enveloped() -> Json<Value> {
    Json(json!({ "users": ["ada"] }))
}

/// Starts the upstream and returns its base URL and hit counter.
async fn spawn_upstream() -> (String, Arc<AtomicUsize>) {
    let upstream = Upstream::default();
    let hits = upstream.hits.clone();
    let app = Router::new()
        .route("/users", get(users))
        .route("/broken", get(broken))
        .route("/raw", get(not_enveloped))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

fn client_for(base_url: &str) -> QueryClient {
    let fetcher = HttpFetcher::new(Duration::from_secs(5))
        .unwrap()
        .with_base_url(base_url);
    let engine = CacheEngine::new(Arc::new(MemoryStorage::new()));
    QueryClient::new(engine, Arc::new(fetcher), QueryOptions::default())
}

// == Tests ==

#[tokio::test]
async fn test_second_query_served_from_cache() {
    let (base_url, hits) = spawn_upstream().await;
    let mut client = client_for(&base_url);

    let first = client.query(QueryRequest::get("/users")).await.unwrap();
    assert_eq!(first["served"], 1);
    assert_eq!(client.state().source, Some(Source::Network));

    let second = client.query(QueryRequest::get("/users")).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(client.state().source, Some(Source::Cache));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refetch_hits_upstream_again() {
    let (base_url, hits) = spawn_upstream().await;
    let mut client = client_for(&base_url);

    client.query(QueryRequest::get("/users")).await.unwrap();
    let refreshed = client.refetch().await.unwrap();

    assert_eq!(refreshed["served"], 2);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_query_as_typed_payload() {
    #[derive(Debug, Deserialize)]
    struct Users {
        users: Vec<String>,
    }

    let (base_url, _) = spawn_upstream().await;
    let mut client = client_for(&base_url);

    let typed: Users = client.query_as(QueryRequest::get("/users")).await.unwrap();
    assert_eq!(typed.users, vec!["ada".to_string()]);
}

#[tokio::test]
async fn test_upstream_status_error_not_cached() {
    let (base_url, _) = spawn_upstream().await;
    let mut client = client_for(&base_url);

    assert!(client.query(QueryRequest::get("/broken")).await.is_none());

    let state = client.state();
    assert!(!state.loading);
    assert_eq!(state.error, Some(CacheError::HttpStatus { status: 500 }));
    assert!(client.engine().mirror().snapshot().is_empty());
}

#[tokio::test]
async fn test_missing_envelope_is_malformed() {
    let (base_url, _) = spawn_upstream().await;
    let mut client = client_for(&base_url);

    assert!(client.query(QueryRequest::get("/raw")).await.is_none());
    assert!(matches!(
        client.state().error,
        Some(CacheError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
    let result = fetcher
        .fetch(&QueryRequest::get(format!("http://{}/users", addr)))
        .await;

    assert!(matches!(result, Err(CacheError::Network(_))));
}
