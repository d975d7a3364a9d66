//! Request Cache - a bounded result cache with request coalescing
//!
//! Serves recent results without re-running the request that produced them,
//! collapses concurrent identical requests into one, and bounds memory with
//! TTL expiration and LRU eviction.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod key;
pub mod models;

pub use api::AppState;
pub use cache::{CacheStats, RequestCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, FetchError};
pub use key::{normalize_query, scoped_key};
