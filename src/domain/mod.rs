//! Domain layer: declarations, descriptors and values.
//!
//! This module holds the data the caching layer reasons about, independent of
//! any backend or registry.
//!
//! # Architecture
//!
//! - [`metadata`] - Declaration table a service type attaches to itself
//! - [`descriptor`] - Validated description of a cacheable method and its keys
//! - [`value`] - Call arguments and the typed envelope stored in the backend
//!
//! # Flow
//!
//! 1. A service declares its methods as a [`metadata::ClassMetadata`]
//! 2. The validator turns annotated methods into [`descriptor::CacheableMethodDescriptor`]s
//! 3. Each call renders its [`value::ParamValue`]s into a [`descriptor::CacheKey`]
//! 4. Results travel to and from the backend as [`value::CachedValue`]s

pub mod descriptor;
pub mod metadata;
pub mod value;

pub use descriptor::{CacheKey, CacheableMethodDescriptor, KEY_SEPARATOR, MethodIdentity};
pub use metadata::{
    CacheAnnotation, ClassMetadata, KeyPolicy, MethodSpec, ParamSpec, ParamType, Receiver,
    ReturnType, Visibility,
};
pub use value::{CacheValue, CachedValue, ParamValue, type_tag};
