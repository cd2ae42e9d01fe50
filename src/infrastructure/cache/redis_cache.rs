//! Redis-backed cache implementation.

use super::service::{BackendError, BackendResult, CacheBackend};
use crate::domain::value::CachedValue;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Redis backend storing values as JSON envelopes.
///
/// Building a `RedisCache` only parses the URL. The connection manager is
/// created on the first command and then shared, so constructing the backend
/// never touches the network.
pub struct RedisCache {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisCache {
    /// Creates a Redis backend for `redis_url` (e.g., `"redis://localhost:6379"`).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ConnectionError`] if the URL is invalid.
    pub fn new(redis_url: &str) -> BackendResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            BackendError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    /// Returns a handle to the shared connection, connecting on first use.
    async fn connection(&self) -> BackendResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                info!("Connecting to Redis");
                let manager = ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(|e| {
                        BackendError::ConnectionError(format!("Failed to connect to Redis: {}", e))
                    })?;
                info!("✓ Connected to Redis");
                Ok::<_, BackendError>(manager)
            })
            .await?;

        Ok(manager.clone())
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> BackendResult<Option<CachedValue>> {
        let mut conn = self.connection().await?;

        let raw = conn
            .get::<_, Option<String>>(key)
            .await
            .map_err(|e| BackendError::OperationError(format!("GET {}: {}", key, e)))?;

        match raw {
            Some(json) => {
                debug!("Cache HIT: {}", key);
                serde_json::from_str(&json)
                    .map(Some)
                    .map_err(|e| BackendError::CodecError(format!("{}: {}", key, e)))
            }
            None => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: CachedValue, ttl_seconds: u64) -> BackendResult<bool> {
        let json = serde_json::to_string(&value)
            .map_err(|e| BackendError::CodecError(format!("{}: {}", key, e)))?;
        let mut conn = self.connection().await?;

        let result = if ttl_seconds > 0 {
            conn.set_ex::<_, _, ()>(key, json, ttl_seconds).await
        } else {
            conn.set::<_, _, ()>(key, json).await
        };

        result.map_err(|e| BackendError::OperationError(format!("SET {}: {}", key, e)))?;
        debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds);
        Ok(true)
    }

    async fn invalidate(&self, key: &str) -> BackendResult<bool> {
        let mut conn = self.connection().await?;

        let deleted = conn
            .del::<_, i32>(key)
            .await
            .map_err(|e| BackendError::OperationError(format!("DEL {}: {}", key, e)))?;

        if deleted > 0 {
            debug!("Cache INVALIDATE: {}", key);
        }
        Ok(deleted > 0)
    }

    async fn health_check(&self) -> bool {
        match self.connection().await {
            Ok(mut conn) => conn.ping::<()>().await.is_ok(),
            Err(_) => false,
        }
    }
}
