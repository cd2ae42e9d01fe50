//! Validated description of one cacheable method.

use serde::Serialize;
use std::fmt;

use crate::domain::metadata::{KeyPolicy, ParamType, ReturnType};

/// Separator between key segments.
pub const KEY_SEPARATOR: char = '|';

/// Declaring type, method name and ordered parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodIdentity {
    pub declaring_type: &'static str,
    pub name: &'static str,
    pub param_types: Vec<ParamType>,
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.declaring_type, self.name)?;
        for (index, ty) in self.param_types.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        f.write_str(")")
    }
}

/// Everything the cache-aside wrapper needs to know about a method.
///
/// Only built by the eligibility validator, so every descriptor satisfies the
/// structural rules and carries a `Normal` policy for each parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheableMethodDescriptor {
    pub identity: MethodIdentity,
    pub literal_key: &'static str,
    pub version: String,
    pub ttl_seconds: u64,
    pub param_names: Vec<&'static str>,
    pub policies: Vec<KeyPolicy>,
    pub return_type: ReturnType,
    key_prefix: String,
}

impl CacheableMethodDescriptor {
    pub(crate) fn new(
        identity: MethodIdentity,
        literal_key: &'static str,
        version: String,
        ttl_seconds: u64,
        param_names: Vec<&'static str>,
        policies: Vec<KeyPolicy>,
        return_type: ReturnType,
    ) -> Self {
        let key_prefix = format!("{version}{KEY_SEPARATOR}{literal_key}{KEY_SEPARATOR}");
        Self {
            identity,
            literal_key,
            version,
            ttl_seconds,
            param_names,
            policies,
            return_type,
            key_prefix,
        }
    }

    /// `version|literal|`, shared by every key of this method.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn param_count(&self) -> usize {
        self.identity.param_types.len()
    }

    pub fn class(&self) -> &'static str {
        self.identity.declaring_type
    }

    pub fn name(&self) -> &'static str {
        self.identity.name
    }
}

/// A rendered cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub(crate) fn new(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
