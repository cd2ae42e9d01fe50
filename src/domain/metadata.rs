//! Declarative method metadata attached to a service type.
//!
//! A service describes its methods once, in [`ServiceClass::metadata`]. The
//! table carries everything the validator needs: modifiers, return type,
//! parameter types, per-parameter key policies and the cache annotation.
//!
//! ```ignore
//! ClassMetadata::new()
//!     .method(
//!         MethodSpec::new("price")
//!             .returns::<f64>()
//!             .param(ParamSpec::normal("sku", ParamType::I32))
//!             .cached("price", 60),
//!     )
//!     .method(MethodSpec::new("region").returns::<String>())
//! ```
//!
//! [`ServiceClass::metadata`]: crate::application::registry::ServiceClass::metadata

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

use crate::domain::value::{CacheValue, type_tag};

/// Declared type of a method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ParamType {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Str,
    /// Any other value rendered through its `Display` form.
    Object,
    /// Slice, array or vector of the element type.
    Array(Box<ParamType>),
}

impl ParamType {
    pub fn array_of(element: ParamType) -> Self {
        Self::Array(Box::new(element))
    }

    /// Primitive types can never be null.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Str | Self::Object | Self::Array(_))
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Char => f.write_str("char"),
            Self::I8 => f.write_str("i8"),
            Self::I16 => f.write_str("i16"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::Str => f.write_str("str"),
            Self::Object => f.write_str("object"),
            Self::Array(element) => write!(f, "[{element}]"),
        }
    }
}

/// How a parameter contributes to the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
pub enum KeyPolicy {
    /// The rendered value is appended to the key.
    Normal,
    /// Reserved for page-aware keys; rejected at registration.
    Paginated,
}

impl fmt::Display for KeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("Normal"),
            Self::Paginated => f.write_str("Paginated"),
        }
    }
}

/// Declared return type of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReturnType {
    Void,
    /// Type tag of the value that is stored in the cache.
    Value(Cow<'static, str>),
}

impl ReturnType {
    pub fn of<T: CacheValue>() -> Self {
        Self::Value(type_tag::<T>())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("()"),
            Self::Value(tag) => f.write_str(tag),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    Public,
    Restricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Receiver {
    /// Takes `&self`; can be decorated.
    Instance,
    /// Associated function without a receiver.
    Associated,
}

/// The cache annotation of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheAnnotation {
    pub enabled: bool,
    pub key: &'static str,
    pub ttl_seconds: u64,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub policy: Option<KeyPolicy>,
}

impl ParamSpec {
    /// A parameter without a key policy.
    pub fn new(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            policy: None,
        }
    }

    /// A parameter rendered into the key as-is.
    pub fn normal(name: &'static str, ty: ParamType) -> Self {
        Self::new(name, ty).policy(KeyPolicy::Normal)
    }

    pub fn policy(mut self, policy: KeyPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

/// One declared method of a service type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSpec {
    pub name: &'static str,
    pub visibility: Visibility,
    pub receiver: Receiver,
    pub has_body: bool,
    pub overridable: bool,
    pub return_type: ReturnType,
    pub params: Vec<ParamSpec>,
    pub cache: Option<CacheAnnotation>,
}

impl MethodSpec {
    /// A public, overridable instance method with a body, returning nothing.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            visibility: Visibility::Public,
            receiver: Receiver::Instance,
            has_body: true,
            overridable: true,
            return_type: ReturnType::Void,
            params: Vec::new(),
            cache: None,
        }
    }

    /// Declares the stored return type. Methods returning `Option<T>` declare `T`.
    pub fn returns<T: CacheValue>(mut self) -> Self {
        self.return_type = ReturnType::of::<T>();
        self
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Enables caching under `key` for `ttl_seconds`.
    pub fn cached(mut self, key: &'static str, ttl_seconds: u64) -> Self {
        self.cache = Some(CacheAnnotation {
            enabled: true,
            key,
            ttl_seconds,
        });
        self
    }

    /// Keeps the annotation but switches it off.
    pub fn disabled(mut self) -> Self {
        if let Some(annotation) = self.cache.as_mut() {
            annotation.enabled = false;
        }
        self
    }

    pub fn restricted(mut self) -> Self {
        self.visibility = Visibility::Restricted;
        self
    }

    pub fn associated(mut self) -> Self {
        self.receiver = Receiver::Associated;
        self
    }

    pub fn without_body(mut self) -> Self {
        self.has_body = false;
        self
    }

    pub fn sealed(mut self) -> Self {
        self.overridable = false;
        self
    }

    /// The cache annotation, if present and enabled.
    pub fn annotation(&self) -> Option<&CacheAnnotation> {
        self.cache.as_ref().filter(|annotation| annotation.enabled)
    }

    pub fn param_types(&self) -> Vec<ParamType> {
        self.params.iter().map(|param| param.ty.clone()).collect()
    }
}

/// The declaration table of one service type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassMetadata {
    pub methods: Vec<MethodSpec>,
}

impl ClassMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }
}
