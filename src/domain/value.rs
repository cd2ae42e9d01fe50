//! Runtime values flowing through the caching layer.
//!
//! [`ParamValue`] carries a call argument into the key builder; [`CachedValue`]
//! is the typed envelope stored in the backend.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Values that can be stored in and read back from the cache.
///
/// The tag is written next to every stored payload and compared on every hit,
/// so it must not change between builds. Service types opt in through
/// [`cache_value!`](crate::cache_value):
///
/// ```ignore
/// cache_value!(Product => "catalog.product");
/// ```
pub trait CacheValue: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn type_tag() -> Cow<'static, str>;
}

/// Implements [`CacheValue`] for a type under a fixed tag.
#[macro_export]
macro_rules! cache_value {
    ($($ty:ty => $tag:expr),+ $(,)?) => {
        $(impl $crate::domain::CacheValue for $ty {
            fn type_tag() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed($tag)
            }
        })+
    };
}

cache_value!(
    bool => "bool",
    char => "char",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    f32 => "f32",
    f64 => "f64",
    String => "string",
    serde_json::Value => "json",
);

impl<T: CacheValue> CacheValue for Vec<T> {
    fn type_tag() -> Cow<'static, str> {
        Cow::Owned(format!("[{}]", T::type_tag()))
    }
}

/// Tag recorded next to every stored payload of type `T`.
pub fn type_tag<T: CacheValue>() -> Cow<'static, str> {
    T::type_tag()
}

/// A call argument as seen by the key builder.
///
/// Integers are held at canonical width, so `5_i8` and `5_i64` are the same
/// value here.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    UInt(u64),
    F32(f32),
    F64(f64),
    Text(String),
    /// Display form of an arbitrary value.
    Object(String),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    /// Captures any value through its `Display` form.
    pub fn display(value: &impl std::fmt::Display) -> Self {
        Self::Object(value.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Char(_) => "char",
            Self::Int(_) => "signed integer",
            Self::UInt(_) => "unsigned integer",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Text(_) => "string",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
        }
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ParamValue {
            fn from(value: $ty) -> Self {
                Self::Int(i64::from(value))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ParamValue {
            fn from(value: $ty) -> Self {
                Self::UInt(u64::from(value))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<char> for ParamValue {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        Self::F32(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<ParamValue>> From<&[T]> for ParamValue {
    fn from(values: &[T]) -> Self {
        Self::Array(values.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Clone + Into<ParamValue>> From<&Vec<T>> for ParamValue {
    fn from(values: &Vec<T>) -> Self {
        Self::from(values.as_slice())
    }
}

/// Builds the argument list of a cached call.
///
/// ```ignore
/// self.proxy.invoke("price", cache_args![sku], || self.inner.price(sku)).await
/// ```
#[macro_export]
macro_rules! cache_args {
    () => {
        ::std::vec::Vec::<$crate::ParamValue>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::ParamValue::from($arg)),+]
    };
}

/// A stored value together with the type it was stored as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedValue {
    pub type_tag: String,
    pub payload: serde_json::Value,
}

impl CachedValue {
    pub fn encode<T: CacheValue>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            type_tag: type_tag::<T>().into_owned(),
            payload: serde_json::to_value(value)?,
        })
    }

    pub fn is_instance_of<T: CacheValue>(&self) -> bool {
        self.type_tag == *type_tag::<T>()
    }

    pub fn decode<T: CacheValue>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
