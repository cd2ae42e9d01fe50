//! Error taxonomy for the caching layer.
//!
//! - [`ConfigurationError`] - misdeclared services, bad arguments, bad settings
//! - [`CacheError::KeyCollision`] - a cache hit holding another method's data
//! - [`CacheError::Construction`] - a service instance could not be built
//! - [`BackendError`] - the key-value store failed
//!
//! Service error types implement `From<CacheError>` so these failures reach
//! the service's own error boundary unchanged.

use thiserror::Error;

pub use crate::infrastructure::cache::BackendError;

/// Boxed error returned by service constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the crate.
pub type CacheResult<T> = Result<T, CacheError>;

/// Top-level error for every operation of the caching layer.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A stored value does not match the declared return type of the method
    /// that read it: two logical caches share one key.
    #[error("cache object conflict, key: {key} (stored `{stored}`, expected `{expected}`)")]
    KeyCollision {
        key: String,
        stored: String,
        expected: String,
    },

    #[error("failed to construct singleton {class}: {source}")]
    Construction {
        class: &'static str,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CacheError {
    pub fn construction(class: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Construction {
            class,
            source: source.into(),
        }
    }

    pub fn key_collision(
        key: impl Into<String>,
        stored: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::KeyCollision {
            key: key.into(),
            stored: stored.into(),
            expected: expected.into(),
        }
    }
}

/// Misconfiguration detected at registration time or at call time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("method can not be abstract, method name: {class}::{method}")]
    AbstractMethod {
        class: &'static str,
        method: &'static str,
    },

    #[error("method must be public, method name: {class}::{method}")]
    NotPublic {
        class: &'static str,
        method: &'static str,
    },

    #[error("method can not be final, method name: {class}::{method}")]
    FinalMethod {
        class: &'static str,
        method: &'static str,
    },

    #[error("method can not be static, method name: {class}::{method}")]
    StaticMethod {
        class: &'static str,
        method: &'static str,
    },

    #[error("method return type can not be void, method name: {class}::{method}")]
    VoidReturn {
        class: &'static str,
        method: &'static str,
    },

    #[error("parameter `{param}` of {class}::{method} has no key policy")]
    MissingKeyPolicy {
        class: &'static str,
        method: &'static str,
        param: &'static str,
    },

    #[error("unsupported key policy {policy} on parameter `{param}` of {class}::{method}")]
    UnsupportedKeyPolicy {
        class: &'static str,
        method: &'static str,
        param: &'static str,
        policy: String,
    },

    #[error("method {class}::{method} is declared more than once")]
    DuplicateMethod {
        class: &'static str,
        method: &'static str,
    },

    #[error("method {class}::{method} is not declared")]
    UnknownMethod { class: &'static str, method: String },

    #[error("{class}::{method} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        class: &'static str,
        method: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("argument {index} of {class}::{method} should be {expected}, got {found}")]
    ArgumentType {
        class: &'static str,
        method: &'static str,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("{class}::{method} is declared to return `{declared}` but was called for `{requested}`")]
    ReturnTypeMismatch {
        class: &'static str,
        method: &'static str,
        declared: String,
        requested: String,
    },

    #[error("unsupported cache backend: {kind}")]
    UnsupportedBackend { kind: String },

    #[error("cache backend `{kind}` requires {setting}")]
    MissingSetting {
        kind: &'static str,
        setting: &'static str,
    },

    #[error("invalid cache configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_collision_reports_key() {
        let err = CacheError::key_collision("v1|price|42|", "string", "f64");
        assert_eq!(
            err.to_string(),
            "cache object conflict, key: v1|price|42| (stored `string`, expected `f64`)"
        );
    }

    #[test]
    fn test_construction_keeps_source() {
        let err = CacheError::construction("PriceService", "pool exhausted");
        assert_eq!(
            err.to_string(),
            "failed to construct singleton PriceService: pool exhausted"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_configuration_is_transparent() {
        let err = CacheError::from(ConfigurationError::VoidReturn {
            class: "Auditor",
            method: "record",
        });
        assert_eq!(
            err.to_string(),
            "method return type can not be void, method name: Auditor::record"
        );
    }
}
