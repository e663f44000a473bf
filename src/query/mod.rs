//! Query Module
//!
//! Request lifecycle built on the cache engine: cache lookup, network
//! fallback, cache population and observable query state.

mod client;
mod fetcher;
mod request;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{QueryClient, QueryOptions, QueryState, Source};
pub use fetcher::{FetchResponse, Fetcher, HttpFetcher};
pub use request::QueryRequest;
