//! API Module
//!
//! HTTP handlers and routing for the cache sidecar.
//!
//! # Endpoints
//! - `PUT /entries` - Pre-warm an entry
//! - `GET /entries/:key` - Read a live entry
//! - `DELETE /entries/:key` - Invalidate an entry and any in-flight request
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
