//! Key Helpers
//!
//! The cache compares keys byte for byte. These helpers give callers one
//! place to turn a raw search string and its scope into a stable key, so
//! "  Graph   Theory" and "graph theory" share an entry while the same text
//! under two graphs does not.

use crate::error::{CacheError, Result};

/// Scope used when a query is not tied to a particular graph.
pub const GLOBAL_SCOPE: &str = "*";

/// Trims, collapses runs of whitespace, and lowercases a query.
pub fn normalize_query(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Builds `"<scope>:<normalized query>"`.
///
/// Fails with [`CacheError::InvalidKey`] when the query is blank or the
/// scope is empty or contains the `:` separator.
pub fn scoped_key(scope: Option<&str>, raw_query: &str) -> Result<String> {
    let query = normalize_query(raw_query);
    if query.is_empty() {
        return Err(CacheError::InvalidKey("Query cannot be blank".to_string()));
    }

    let scope = scope.map(str::trim).unwrap_or(GLOBAL_SCOPE);
    if scope.is_empty() || scope.contains(':') {
        return Err(CacheError::InvalidKey(format!("Invalid scope '{}'", scope)));
    }

    Ok(format!("{}:{}", scope, query))
}
