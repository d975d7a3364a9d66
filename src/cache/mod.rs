//! Cache Module
//!
//! Bounded result caching with TTL expiration, LRU eviction, and in-flight
//! request coalescing.

mod entry;
mod lru;
mod request_cache;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::RecencyIndex;
pub use request_cache::{validate_key, RequestCache};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;
