//! # Cache Provider
//!
//! Transparent cache-aside for service objects, backed by Redis.
//!
//! A service type declares its methods once. Methods carrying an enabled
//! cache annotation are served from the backend when a value is stored under
//! their key, and run their original body otherwise. Callers only ever see the
//! service's own trait.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Declarations, method descriptors and values
//! - **Application Layer** ([`application`]) - Validator, key builder, interceptor, registry
//! - **Infrastructure Layer** ([`infrastructure`]) - Backends and their selector
//!
//! ## Keys
//!
//! `version|literal|arg1|arg2|...|`, for example `v1.0|price|42|`. Arrays
//! render each element as `[element]`; null and empty arrays render `null`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cache_provider::prelude::*;
//!
//! let prices = cache_provider::get_singleton::<PriceService>()?;
//! let price = prices.price(42).await?; // computed, then stored for 60s
//! let again = prices.price(42).await?; // served from the cache
//! ```
//!
//! ## Configuration
//!
//! Loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod telemetry;

pub use application::provider::{get_singleton, global, install, reset};
pub use domain::value::ParamValue;
pub use error::{BoxError, CacheError, CacheResult, ConfigurationError};

/// Commonly used types for service declarations.
///
/// Re-exports what a cached service and its decorator need, for library
/// users and integration tests.
pub mod prelude {
    pub use crate::application::{CacheProvider, CacheProxy, ServiceClass};
    pub use crate::cache_args;
    pub use crate::cache_value;
    pub use crate::config::{Config, GetFailurePolicy};
    pub use crate::domain::{
        CacheValue, ClassMetadata, KeyPolicy, MethodSpec, ParamSpec, ParamType, ParamValue,
    };
    pub use crate::error::{BoxError, CacheError, ConfigurationError};
    pub use crate::infrastructure::cache::{CacheBackend, MemoryCache, NullCache, RedisCache};
}
