//! Cache backend trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::value::CachedValue;

/// Errors that can occur during backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("cache connection error: {0}")]
    ConnectionError(String),
    #[error("cache operation error: {0}")]
    OperationError(String),
    /// The stored bytes are not a value envelope.
    #[error("cache codec error: {0}")]
    CodecError(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Key-value store with TTL semantics used by every cached call.
///
/// Implementations report failures instead of swallowing them; the caller
/// decides whether a failed `get` is a forced miss or an error. A failure is
/// never reported as a hit.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed store
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process store with expiry
/// - [`crate::infrastructure::cache::NullCache`] - Never stores anything
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Retrieves the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` on hit
    /// - `Ok(None)` on miss or expired entry
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] on connectivity or protocol failure.
    async fn get(&self, key: &str) -> BackendResult<Option<CachedValue>>;

    /// Stores `value` under `key` for `ttl_seconds` (`0` keeps it until evicted).
    ///
    /// Returns whether the backend accepted the value.
    async fn set(&self, key: &str, value: CachedValue, ttl_seconds: u64) -> BackendResult<bool>;

    /// Removes a key. Returns whether something was removed.
    async fn invalidate(&self, key: &str) -> BackendResult<bool>;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;
}
