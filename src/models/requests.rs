//! Request DTOs for the cache sidecar API

use serde::Deserialize;
use serde_json::Value;

use crate::cache::validate_key;
use crate::error::CacheError;

/// Request body for pre-warming an entry (PUT /entries)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// Caller-normalized cache key
    pub key: String,
    /// Arbitrary JSON result to cache
    pub value: Value,
    /// Optional TTL override in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl SetRequest {
    /// Validates the request data.
    pub fn validate(&self) -> Result<(), CacheError> {
        validate_key(&self.key)
    }
}
