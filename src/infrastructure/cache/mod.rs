//! Cache backends for cache-aside calls.
//!
//! Provides a [`CacheBackend`] trait with three implementations:
//! - [`RedisCache`] - Production Redis-backed store
//! - [`MemoryCache`] - In-process store with per-entry expiry
//! - [`NullCache`] - No-op implementation for disabled caching
//!
//! [`BackendSelector`] picks one of them from configuration, once.

mod memory_cache;
mod null_cache;
mod redis_cache;
mod selector;
mod service;

pub use memory_cache::MemoryCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use selector::{BackendKind, BackendSelector};
pub use service::{BackendError, BackendResult, CacheBackend};

#[cfg(test)]
pub use service::MockCacheBackend;
