//! No-op backend for disabled caching.

use super::service::{BackendResult, CacheBackend};
use crate::domain::value::CachedValue;
use async_trait::async_trait;
use tracing::debug;

/// A backend that stores nothing.
///
/// Every `get` misses and every `set` reports that nothing was stored, so
/// wrapped methods always run their original body.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn get(&self, _key: &str) -> BackendResult<Option<CachedValue>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: CachedValue, _ttl_seconds: u64) -> BackendResult<bool> {
        Ok(false)
    }

    async fn invalidate(&self, _key: &str) -> BackendResult<bool> {
        Ok(false)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
