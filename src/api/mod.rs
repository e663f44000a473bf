//! API Module
//!
//! HTTP handlers and routing for the caching gateway.
//!
//! # Endpoints
//! - `POST /query` - Answer a request from cache or upstream
//! - `POST /refetch` - Invalidate and re-issue the last request
//! - `POST /invalidate` - Evict the cached answer to the last request
//! - `GET /cache` - Current mirror snapshot
//! - `DELETE /cache/:collection` - Remove a whole collection
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
