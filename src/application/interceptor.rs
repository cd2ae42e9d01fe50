//! Cache-aside interception of declared service methods.
//!
//! A cached decorator routes every call through [`CacheProxy`]:
//!
//! ```ignore
//! async fn price(&self, sku: i32) -> Result<f64, LookupError> {
//!     self.proxy
//!         .invoke("price", cache_args![sku], || self.inner.price(sku))
//!         .await
//! }
//! ```
//!
//! Cacheable methods look their key up first and only run the original body
//! on a miss. Declared methods without a cache annotation run the body
//! directly. The body's own errors are returned unchanged and never cached.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::application::key_builder::build_key;
use crate::application::validator::MethodTable;
use crate::config::GetFailurePolicy;
use crate::domain::descriptor::{CacheKey, CacheableMethodDescriptor};
use crate::domain::metadata::ReturnType;
use crate::domain::value::{CacheValue, CachedValue, ParamValue, type_tag};
use crate::error::{CacheError, ConfigurationError};
use crate::infrastructure::cache::{BackendSelector, CacheBackend};

/// Result of one cache-aside pass.
enum Outcome<T, R> {
    Hit(T),
    Computed(R),
}

/// Per-type interception state shared by a cached decorator.
pub struct CacheProxy {
    class: &'static str,
    table: Arc<MethodTable>,
    backend: Arc<BackendSelector>,
    get_failure: GetFailurePolicy,
}

impl CacheProxy {
    pub fn new(
        class: &'static str,
        table: Arc<MethodTable>,
        backend: Arc<BackendSelector>,
        get_failure: GetFailurePolicy,
    ) -> Self {
        Self {
            class,
            table,
            backend,
            get_failure,
        }
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    pub fn table(&self) -> &MethodTable {
        &self.table
    }

    /// Runs `body` behind the cache entry of `method`.
    ///
    /// On a hit the stored value is returned and `body` is not called. On a
    /// miss `body` runs and its value is stored with the method's TTL before
    /// being returned.
    ///
    /// # Errors
    ///
    /// - [`CacheError::KeyCollision`] when the stored value is not a `T`
    /// - [`ConfigurationError`] for an undeclared method, arguments that do
    ///   not match the declaration or a `T` other than the declared return type
    /// - [`CacheError::Backend`] when `get` fails under
    ///   [`GetFailurePolicy::Propagate`]
    /// - whatever `body` returns
    pub async fn invoke<T, E, F, Fut>(
        &self,
        method: &str,
        args: Vec<ParamValue>,
        body: F,
    ) -> Result<T, E>
    where
        T: CacheValue,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let outcome = self
            .cache_aside(method, &args, body, |value: &T| Some(value))
            .await?;

        Ok(match outcome {
            Outcome::Hit(value) | Outcome::Computed(value) => value,
        })
    }

    /// Like [`invoke`](Self::invoke) for methods that may find nothing.
    ///
    /// `None` is never stored, so the next call runs `body` again. The method
    /// declares `T` as its return type.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub async fn invoke_optional<T, E, F, Fut>(
        &self,
        method: &str,
        args: Vec<ParamValue>,
        body: F,
    ) -> Result<Option<T>, E>
    where
        T: CacheValue,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let outcome = self
            .cache_aside(method, &args, body, |value: &Option<T>| value.as_ref())
            .await?;

        Ok(match outcome {
            Outcome::Hit(value) => Some(value),
            Outcome::Computed(value) => value,
        })
    }

    async fn cache_aside<T, R, E, F, Fut, P>(
        &self,
        method: &str,
        args: &[ParamValue],
        body: F,
        storable: P,
    ) -> Result<Outcome<T, R>, E>
    where
        T: CacheValue,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        P: FnOnce(&R) -> Option<&T>,
    {
        let Some(descriptor) = self.table.descriptor(method) else {
            if self.table.is_passthrough(method) {
                return body().await.map(Outcome::Computed);
            }
            return Err(CacheError::from(ConfigurationError::UnknownMethod {
                class: self.class,
                method: method.to_string(),
            })
            .into());
        };

        let requested = type_tag::<T>();
        if descriptor.return_type != ReturnType::Value(requested.clone()) {
            return Err(CacheError::from(ConfigurationError::ReturnTypeMismatch {
                class: self.class,
                method: descriptor.name(),
                declared: descriptor.return_type.to_string(),
                requested: requested.into_owned(),
            })
            .into());
        }

        let key = build_key(descriptor, args).map_err(CacheError::from)?;
        let backend = self.backend.current()?;

        match backend.get(key.as_str()).await {
            Ok(Some(cached)) => {
                return self
                    .accept_hit(descriptor, &key, cached)
                    .map(Outcome::Hit)
                    .map_err(E::from);
            }
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                self.count("cache_provider_miss_total", descriptor);
            }
            Err(e) => {
                self.count("cache_provider_get_error_total", descriptor);
                match self.get_failure {
                    GetFailurePolicy::Recompute => {
                        warn!("Cache GET error for {}: {}; recomputing", key, e);
                    }
                    GetFailurePolicy::Propagate => return Err(CacheError::Backend(e).into()),
                }
            }
        }

        let result = body().await?;
        if let Some(value) = storable(&result) {
            self.store(backend.as_ref(), descriptor, &key, value).await;
        } else {
            debug!("Cache SKIP (nothing to store): {}", key);
        }
        Ok(Outcome::Computed(result))
    }

    fn accept_hit<T: CacheValue>(
        &self,
        descriptor: &CacheableMethodDescriptor,
        key: &CacheKey,
        cached: CachedValue,
    ) -> Result<T, CacheError> {
        let expected = type_tag::<T>();
        if !cached.is_instance_of::<T>() {
            self.count("cache_provider_collision_total", descriptor);
            return Err(CacheError::key_collision(
                key.as_str(),
                cached.type_tag,
                expected,
            ));
        }

        match cached.decode::<T>() {
            Ok(value) => {
                debug!("Cache HIT: {}", key);
                self.count("cache_provider_hit_total", descriptor);
                Ok(value)
            }
            Err(e) => {
                self.count("cache_provider_collision_total", descriptor);
                Err(CacheError::key_collision(
                    key.as_str(),
                    format!("{} (undecodable: {})", cached.type_tag, e),
                    expected,
                ))
            }
        }
    }

    /// Stores a computed value. Failures are logged and counted only.
    async fn store<T: CacheValue>(
        &self,
        backend: &dyn CacheBackend,
        descriptor: &CacheableMethodDescriptor,
        key: &CacheKey,
        value: &T,
    ) {
        let cached = match CachedValue::encode(value) {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Cache encode error for {}: {}", key, e);
                self.count("cache_provider_store_failed_total", descriptor);
                return;
            }
        };

        match backend.set(key.as_str(), cached, descriptor.ttl_seconds).await {
            Ok(true) => {
                debug!("Cache SET: {} (TTL: {}s)", key, descriptor.ttl_seconds);
                self.count("cache_provider_store_total", descriptor);
            }
            Ok(false) => debug!("Cache SET declined by {}: {}", backend.name(), key),
            Err(e) => {
                warn!("Cache SET error for {}: {}", key, e);
                self.count("cache_provider_store_failed_total", descriptor);
            }
        }
    }

    fn count(&self, name: &'static str, descriptor: &CacheableMethodDescriptor) {
        counter!(name, "class" => self.class, "method" => descriptor.name()).increment(1);
    }
}
