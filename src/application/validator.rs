//! Eligibility validator: which declared methods may be cached.
//!
//! Every declared method is classified on its own. A method is cacheable when
//! its annotation is enabled and it is public, has a body, is overridable,
//! takes `&self` and returns a value. Breaking any of those rules on an
//! annotated method fails registration, except a void return in lenient mode,
//! which only drops the method from caching.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, warn};

use crate::domain::descriptor::{CacheableMethodDescriptor, MethodIdentity};
use crate::domain::metadata::{
    CacheAnnotation, ClassMetadata, KeyPolicy, MethodSpec, Receiver, Visibility,
};
use crate::error::ConfigurationError;

/// How strictly annotated methods are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Void-returning annotated methods fail registration.
    Strict,
    /// Void-returning annotated methods are silently left uncached.
    Lenient,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Lenient => f.write_str("lenient"),
        }
    }
}

/// Validated methods of one service type.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    cacheable: HashMap<&'static str, CacheableMethodDescriptor>,
    passthrough: HashSet<&'static str>,
}

impl MethodTable {
    /// Whether the type needs a cached decorator at all.
    pub fn has_cacheable(&self) -> bool {
        !self.cacheable.is_empty()
    }

    pub fn descriptor(&self, method: &str) -> Option<&CacheableMethodDescriptor> {
        self.cacheable.get(method)
    }

    /// Declared but not cached: calls go straight to the original body.
    pub fn is_passthrough(&self, method: &str) -> bool {
        self.passthrough.contains(method)
    }

    /// Descriptors sorted by method name.
    pub fn descriptors(&self) -> Vec<&CacheableMethodDescriptor> {
        let mut descriptors: Vec<_> = self.cacheable.values().collect();
        descriptors.sort_by_key(|descriptor| descriptor.name());
        descriptors
    }

    /// Names of pass-through methods, sorted.
    pub fn passthrough_methods(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.passthrough.iter().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.cacheable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cacheable.is_empty()
    }
}

/// Scans a declaration table and builds the method table.
///
/// # Errors
///
/// Returns the first [`ConfigurationError`] found: a modifier violation on an
/// annotated method, a void return in strict mode, a missing or unsupported
/// key policy, or a method name declared twice.
pub fn scan(
    class: &'static str,
    metadata: &ClassMetadata,
    version: &str,
    mode: ValidationMode,
) -> Result<MethodTable, ConfigurationError> {
    let mut table = MethodTable::default();
    let mut seen = HashSet::new();

    for method in &metadata.methods {
        if !seen.insert(method.name) {
            return Err(ConfigurationError::DuplicateMethod {
                class,
                method: method.name,
            });
        }

        if let Some(annotation) = check_method(class, method, mode)? {
            let descriptor = describe(class, method, annotation, version)?;
            debug!(
                "Cacheable method {} (key prefix {})",
                descriptor.identity,
                descriptor.key_prefix()
            );
            table.cacheable.insert(method.name, descriptor);
        } else {
            table.passthrough.insert(method.name);
        }
    }

    Ok(table)
}

/// Returns whether at least one declared method is cacheable.
///
/// # Errors
///
/// Same as [`scan`].
pub fn has_cache_method(
    class: &'static str,
    metadata: &ClassMetadata,
    mode: ValidationMode,
) -> Result<bool, ConfigurationError> {
    scan(class, metadata, "", mode).map(|table| table.has_cacheable())
}

fn check_method<'a>(
    class: &'static str,
    method: &'a MethodSpec,
    mode: ValidationMode,
) -> Result<Option<&'a CacheAnnotation>, ConfigurationError> {
    let Some(annotation) = method.annotation() else {
        return Ok(None);
    };

    let name = method.name;
    if !method.has_body {
        return Err(ConfigurationError::AbstractMethod {
            class,
            method: name,
        });
    }
    if method.visibility != Visibility::Public {
        return Err(ConfigurationError::NotPublic {
            class,
            method: name,
        });
    }
    if !method.overridable {
        return Err(ConfigurationError::FinalMethod {
            class,
            method: name,
        });
    }
    if method.receiver == Receiver::Associated {
        return Err(ConfigurationError::StaticMethod {
            class,
            method: name,
        });
    }

    if method.return_type.is_void() {
        return match mode {
            ValidationMode::Strict => Err(ConfigurationError::VoidReturn {
                class,
                method: name,
            }),
            ValidationMode::Lenient => {
                warn!("{}::{} returns nothing; caching skipped", class, name);
                Ok(None)
            }
        };
    }

    Ok(Some(annotation))
}

fn describe(
    class: &'static str,
    method: &MethodSpec,
    annotation: &CacheAnnotation,
    version: &str,
) -> Result<CacheableMethodDescriptor, ConfigurationError> {
    let mut policies = Vec::with_capacity(method.params.len());

    for param in &method.params {
        match param.policy {
            Some(KeyPolicy::Normal) => policies.push(KeyPolicy::Normal),
            Some(other) => {
                return Err(ConfigurationError::UnsupportedKeyPolicy {
                    class,
                    method: method.name,
                    param: param.name,
                    policy: other.to_string(),
                });
            }
            None => {
                return Err(ConfigurationError::MissingKeyPolicy {
                    class,
                    method: method.name,
                    param: param.name,
                });
            }
        }
    }

    Ok(CacheableMethodDescriptor::new(
        MethodIdentity {
            declaring_type: class,
            name: method.name,
            param_types: method.param_types(),
        },
        annotation.key,
        version.to_string(),
        annotation.ttl_seconds,
        method.params.iter().map(|param| param.name).collect(),
        policies,
        method.return_type.clone(),
    ))
}
