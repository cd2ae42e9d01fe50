//! Application layer: validation, key building, interception and the registry.
//!
//! # Components
//!
//! - [`validator`] - Decides which declared methods are cacheable
//! - [`key_builder`] - Renders call arguments into cache keys
//! - [`interceptor::CacheProxy`] - Cache-aside wrapper used by cached decorators
//! - [`registry`] - [`registry::ServiceClass`] and the per-type singleton cells
//! - [`provider::CacheProvider`] - Public entry point tying it all together
//! - [`diagnostics`] - Wrapping reports written in strict mode

pub mod diagnostics;
pub mod interceptor;
pub mod key_builder;
pub mod provider;
pub mod registry;
pub mod validator;

pub use interceptor::CacheProxy;
pub use key_builder::build_key;
pub use provider::CacheProvider;
pub use registry::{ServiceClass, SingletonRegistry};
pub use validator::{MethodTable, ValidationMode, has_cache_method, scan};
