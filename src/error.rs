//! Error types for the request cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors raised by the cache itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key absent or expired
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Empty or oversized key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Rejected construction parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Fetch Error ==
/// Failure of a `get_or_create` call.
///
/// Every caller that joined the same in-flight request receives the same
/// `Arc` of the factory's error.
#[derive(Error, Debug)]
pub enum FetchError<E> {
    /// The request was rejected before reaching the factory
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The factory failed
    #[error("Factory failed: {0}")]
    Factory(Arc<E>),
}

impl<E> FetchError<E> {
    /// The shared factory error, if the factory is what failed.
    pub fn factory_error(&self) -> Option<&Arc<E>> {
        match self {
            FetchError::Factory(err) => Some(err),
            FetchError::Cache(_) => None,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
