//! Fetcher
//!
//! The network seam: turns a [`QueryRequest`] into a status and a body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::query::QueryRequest;

/// Raw upstream answer.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// Payloads arrive wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| CacheError::MalformedResponse(e.to_string()))
    }

    /// Extracts the `data` field of the body.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        self.json::<Envelope<T>>().map(|envelope| envelope.data)
    }
}

/// Something that can perform a request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &QueryRequest) -> Result<FetchResponse>;
}

// == HTTP Fetcher ==
/// [`Fetcher`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Option<String>,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Internal(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: None,
        })
    }

    /// Resolves relative request URLs against `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    fn resolve(&self, url: &str) -> Result<String> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(url.to_string());
        }

        match &self.base_url {
            Some(base) if url.starts_with('/') => Ok(format!("{}{}", base, url)),
            Some(base) => Ok(format!("{}/{}", base, url)),
            None => Err(CacheError::InvalidRequest(format!(
                "relative URL '{}' without an upstream base URL",
                url
            ))),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &QueryRequest) -> Result<FetchResponse> {
        let url = self.resolve(&request.url)?;
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| CacheError::InvalidRequest(format!("bad method '{}'", request.method)))?;

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!("Fetching {} {}", request.method, url);
        let response = builder
            .send()
            .await
            .map_err(|e| CacheError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CacheError::Network(e.to_string()))?;

        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_is_ok_range() {
        assert!(FetchResponse::new(200, "").is_ok());
        assert!(FetchResponse::new(204, "").is_ok());
        assert!(!FetchResponse::new(304, "").is_ok());
        assert!(!FetchResponse::new(500, "").is_ok());
    }

    #[test]
    fn test_data_extracts_payload() {
        let response = FetchResponse::new(200, r#"{"data": {"users": []}, "meta": 1}"#);
        assert_eq!(response.data::<Value>().unwrap(), json!({"users": []}));
    }

    #[test]
    fn test_data_missing_field_is_malformed() {
        let response = FetchResponse::new(200, r#"{"users": []}"#);
        assert!(matches!(
            response.data::<Value>(),
            Err(CacheError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let response = FetchResponse::new(200, "<html></html>");
        assert!(matches!(
            response.json::<Value>(),
            Err(CacheError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_resolve_urls() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://api.local/");

        assert_eq!(fetcher.resolve("/users").unwrap(), "http://api.local/users");
        assert_eq!(fetcher.resolve("users").unwrap(), "http://api.local/users");
        assert_eq!(
            fetcher.resolve("https://other.example/x").unwrap(),
            "https://other.example/x"
        );
    }

    #[test]
    fn test_relative_url_without_base_is_rejected() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        assert!(matches!(
            fetcher.resolve("/users"),
            Err(CacheError::InvalidRequest(_))
        ));
    }
}
