//! In-process backend with per-entry expiry.

use super::service::{BackendResult, CacheBackend};
use crate::domain::value::CachedValue;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

struct Entry {
    value: CachedValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Backend keeping values in a concurrent map inside the process.
///
/// Expired entries are dropped lazily on read. Useful for single-process
/// deployments, local development and tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        debug!("Using MemoryCache");
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> BackendResult<Option<CachedValue>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                debug!("Cache HIT: {}", key);
                return Ok(Some(entry.value.clone()));
            }
        } else {
            debug!("Cache MISS: {}", key);
            return Ok(None);
        }

        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        debug!("Cache EXPIRED: {}", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: CachedValue, ttl_seconds: u64) -> BackendResult<bool> {
        let expires_at = (ttl_seconds > 0).then(|| Instant::now() + Duration::from_secs(ttl_seconds));
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds);
        Ok(true)
    }

    async fn invalidate(&self, key: &str) -> BackendResult<bool> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            debug!("Cache INVALIDATE: {}", key);
        }
        Ok(removed)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
