//! Scripted fetcher shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::{CacheError, Result};
use crate::query::{FetchResponse, Fetcher, QueryRequest, QueryState};

/// Answers with queued responses in order and counts calls.
///
/// Once given a state receiver, it also records the `loading` flag seen at
/// each fetch.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<FetchResponse>>>,
    calls: AtomicUsize,
    observer: OnceLock<watch::Receiver<QueryState>>,
    loading_seen: Mutex<Vec<bool>>,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<FetchResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        })
    }

    /// Fetcher answering each call with `{"data": payload}` in order.
    pub fn data(payloads: Vec<Value>) -> Arc<Self> {
        Self::new(
            payloads
                .into_iter()
                .map(|data| {
                    let body = serde_json::json!({ "data": data }).to_string();
                    Ok(FetchResponse::new(200, body))
                })
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Watches `state` from inside every later fetch. Only the first call counts.
    pub fn observe(&self, state: watch::Receiver<QueryState>) {
        let _ = self.observer.set(state);
    }

    /// `loading` as seen by each fetch since [`observe`](Self::observe).
    pub fn loading_seen(&self) -> Vec<bool> {
        self.loading_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, _request: &QueryRequest) -> Result<FetchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(state) = self.observer.get() {
            let loading = state.borrow().loading;
            self.loading_seen.lock().unwrap().push(loading);
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CacheError::Network("no scripted response left".into())))
    }
}
