//! Request DTOs for the query cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::codec::EXPIRATION_SEPARATOR;
use crate::query::QueryRequest;

/// Request body for POST /query
///
/// # Fields
/// - `url`: Upstream URL, absolute or relative to the configured base
/// - `method`: HTTP method (default GET)
/// - `headers`: Headers forwarded upstream, not part of the cache key
/// - `body`: JSON body forwarded upstream, not part of the cache key
#[derive(Debug, Clone, Deserialize)]
pub struct QueryBody {
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl QueryBody {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.url.trim().is_empty() {
            return Some("URL cannot be empty".to_string());
        }
        if self.url.contains(EXPIRATION_SEPARATOR) {
            return Some(format!("URL cannot contain '{}'", EXPIRATION_SEPARATOR));
        }
        if let Some(method) = &self.method {
            if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
                return Some(format!("Invalid HTTP method '{}'", method));
            }
        }
        None
    }

    pub fn into_request(self) -> QueryRequest {
        let mut request = QueryRequest::get(self.url);
        if let Some(method) = self.method {
            request = request.method(method.to_ascii_uppercase());
        }
        request.headers = self.headers;
        request.body = self.body;
        request
    }
}
