//! Deterministic cache key construction.
//!
//! A key is `version|literal|` followed by `render(arg)|` for every argument
//! in declaration order. Rendering follows the declared parameter type:
//!
//! - arrays render each element as `[element]`; a null array and an empty
//!   array both render `null`, as do null reference values
//! - integers render at canonical width, so `5_i8` and `5_i64` agree
//! - floats use their shortest round-trip form
//! - strings, chars and `Display` values render verbatim
//!
//! The same descriptor and arguments always yield the same key.

use crate::domain::descriptor::{CacheKey, CacheableMethodDescriptor, KEY_SEPARATOR};
use crate::domain::metadata::{KeyPolicy, ParamType};
use crate::domain::value::ParamValue;
use crate::error::ConfigurationError;

/// Text of a null reference and of an empty array.
const NULL_SEGMENT: &str = "null";

/// Builds the cache key of one call.
///
/// # Errors
///
/// Returns [`ConfigurationError::ArgumentCount`] when the argument list does
/// not match the declared parameters, [`ConfigurationError::ArgumentType`]
/// when an argument does not fit its declared type, and
/// [`ConfigurationError::UnsupportedKeyPolicy`] for any policy but `Normal`.
pub fn build_key(
    descriptor: &CacheableMethodDescriptor,
    args: &[ParamValue],
) -> Result<CacheKey, ConfigurationError> {
    let expected = descriptor.param_count();
    if args.len() != expected {
        return Err(ConfigurationError::ArgumentCount {
            class: descriptor.class(),
            method: descriptor.name(),
            expected,
            actual: args.len(),
        });
    }

    let mut key = String::with_capacity(descriptor.key_prefix().len() + 8 * args.len());
    key.push_str(descriptor.key_prefix());

    let params = descriptor
        .identity
        .param_types
        .iter()
        .zip(&descriptor.policies)
        .zip(&descriptor.param_names)
        .zip(args);

    for (index, (((ty, policy), name), value)) in params.enumerate() {
        match policy {
            KeyPolicy::Normal => {
                render(ty, value, &mut key).map_err(|found| ConfigurationError::ArgumentType {
                    class: descriptor.class(),
                    method: descriptor.name(),
                    index,
                    expected: ty.to_string(),
                    found: found.to_string(),
                })?;
            }
            other => {
                return Err(ConfigurationError::UnsupportedKeyPolicy {
                    class: descriptor.class(),
                    method: descriptor.name(),
                    param: name,
                    policy: other.to_string(),
                });
            }
        }
        key.push(KEY_SEPARATOR);
    }

    Ok(CacheKey::new(key))
}

/// Appends the rendering of `value` as a `ty` to `out`.
///
/// On mismatch returns the kind of the offending value.
fn render(ty: &ParamType, value: &ParamValue, out: &mut String) -> Result<(), &'static str> {
    match (ty, value) {
        (ParamType::Array(_), ParamValue::Null) => out.push_str(NULL_SEGMENT),
        (ParamType::Array(_), ParamValue::Array(items)) if items.is_empty() => {
            out.push_str(NULL_SEGMENT)
        }
        (ParamType::Array(element), ParamValue::Array(items)) => {
            for item in items {
                out.push('[');
                render(element, item, out)?;
                out.push(']');
            }
        }
        (ty, ParamValue::Null) if !ty.is_primitive() => out.push_str(NULL_SEGMENT),
        (ParamType::Object, ParamValue::Array(_) | ParamValue::Null) => return Err(value.kind()),
        (ParamType::Object, scalar) => render_scalar(scalar, out),
        (ParamType::Bool, ParamValue::Bool(_))
        | (ParamType::Char, ParamValue::Char(_))
        | (ParamType::I8 | ParamType::I16 | ParamType::I32 | ParamType::I64, ParamValue::Int(_))
        | (ParamType::U8 | ParamType::U16 | ParamType::U32 | ParamType::U64, ParamValue::UInt(_))
        | (ParamType::F32, ParamValue::F32(_))
        | (ParamType::F64, ParamValue::F64(_))
        | (ParamType::Str, ParamValue::Text(_)) => render_scalar(value, out),
        _ => return Err(value.kind()),
    }
    Ok(())
}

fn render_scalar(value: &ParamValue, out: &mut String) {
    match value {
        ParamValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        ParamValue::Char(v) => out.push(*v),
        ParamValue::Int(v) => out.push_str(&v.to_string()),
        ParamValue::UInt(v) => out.push_str(&v.to_string()),
        ParamValue::F32(v) => out.push_str(&v.to_string()),
        ParamValue::F64(v) => out.push_str(&v.to_string()),
        ParamValue::Text(v) | ParamValue::Object(v) => out.push_str(v),
        ParamValue::Null | ParamValue::Array(_) => out.push_str(NULL_SEGMENT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::validator::{ValidationMode, scan};
    use crate::cache_args;
    use crate::domain::metadata::{ClassMetadata, MethodSpec, ParamSpec};

    fn descriptor(key: &'static str, params: Vec<ParamSpec>) -> CacheableMethodDescriptor {
        let mut method = MethodSpec::new(key).returns::<String>().cached(key, 60);
        for param in params {
            method = method.param(param);
        }
        let table = scan(
            "Catalog",
            &ClassMetadata::new().method(method),
            "v1",
            ValidationMode::Strict,
        )
        .unwrap();
        table.descriptor(key).unwrap().clone()
    }

    fn key(descriptor: &CacheableMethodDescriptor, args: Vec<ParamValue>) -> String {
        build_key(descriptor, &args).unwrap().into_string()
    }

    #[test]
    fn test_scalar_key() {
        let d = descriptor("price", vec![ParamSpec::normal("sku", ParamType::I32)]);
        assert_eq!(key(&d, cache_args![42]), "v1|price|42|");
    }

    #[test]
    fn test_no_params() {
        let d = descriptor("all", vec![]);
        assert_eq!(key(&d, cache_args![]), "v1|all|");
    }

    #[test]
    fn test_key_is_deterministic() {
        let d = descriptor(
            "find",
            vec![
                ParamSpec::normal("name", ParamType::Str),
                ParamSpec::normal("limit", ParamType::U32),
            ],
        );
        let first = key(&d, cache_args!["bob", 10_u32]);
        let second = key(&d, cache_args![String::from("bob"), 10_u32]);
        assert_eq!(first, second);
        assert_eq!(first, "v1|find|bob|10|");
    }

    #[test]
    fn test_narrow_integers_render_like_wide() {
        let narrow = descriptor("n", vec![ParamSpec::normal("v", ParamType::I8)]);
        let wide = descriptor("n", vec![ParamSpec::normal("v", ParamType::I64)]);
        assert_eq!(key(&narrow, cache_args![-5_i8]), key(&wide, cache_args![-5_i64]));
        assert_eq!(key(&narrow, cache_args![-5_i8]), "v1|n|-5|");
    }

    #[test]
    fn test_array_rendering() {
        let d = descriptor(
            "lookup",
            vec![ParamSpec::normal("ids", ParamType::array_of(ParamType::I32))],
        );
        assert_eq!(key(&d, cache_args![vec![1, 2, 3]]), "v1|lookup|[1][2][3]|");
    }

    #[test]
    fn test_null_and_empty_arrays_share_a_key() {
        let d = descriptor(
            "lookup",
            vec![ParamSpec::normal("ids", ParamType::array_of(ParamType::I32))],
        );
        let empty: &[i32] = &[];
        let null: Option<Vec<i32>> = None;

        assert_eq!(key(&d, cache_args![empty]), "v1|lookup|null|");
        assert_eq!(key(&d, cache_args![null]), "v1|lookup|null|");
    }

    #[test]
    fn test_string_array_with_null_element() {
        let d = descriptor(
            "tags",
            vec![ParamSpec::normal("tags", ParamType::array_of(ParamType::Str))],
        );
        let tags = vec![Some("a"), None, Some("b")];
        assert_eq!(key(&d, cache_args![tags]), "v1|tags|[a][null][b]|");
    }

    #[test]
    fn test_nested_arrays() {
        let d = descriptor(
            "grid",
            vec![ParamSpec::normal(
                "cells",
                ParamType::array_of(ParamType::array_of(ParamType::U8)),
            )],
        );
        let cells = vec![vec![1_u8, 2], vec![]];
        assert_eq!(key(&d, cache_args![cells]), "v1|grid|[[1][2]][null]|");
    }

    #[test]
    fn test_null_reference_and_object() {
        let d = descriptor(
            "who",
            vec![
                ParamSpec::normal("name", ParamType::Str),
                ParamSpec::normal("at", ParamType::Object),
            ],
        );
        assert_eq!(
            key(&d, vec![ParamValue::Null, ParamValue::display(&"10.0.0.1")]),
            "v1|who|null|10.0.0.1|"
        );
        assert_eq!(key(&d, cache_args!["x", 7]), "v1|who|x|7|");
    }

    #[test]
    fn test_bool_char_float() {
        let d = descriptor(
            "mix",
            vec![
                ParamSpec::normal("flag", ParamType::Bool),
                ParamSpec::normal("grade", ParamType::Char),
                ParamSpec::normal("ratio", ParamType::F64),
            ],
        );
        assert_eq!(key(&d, cache_args![true, 'A', 0.5]), "v1|mix|true|A|0.5|");
    }

    #[test]
    fn test_argument_count_mismatch() {
        let d = descriptor("price", vec![ParamSpec::normal("sku", ParamType::I32)]);
        assert_eq!(
            build_key(&d, &cache_args![1, 2]).unwrap_err(),
            ConfigurationError::ArgumentCount {
                class: "Catalog",
                method: "price",
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_argument_type_mismatch() {
        let d = descriptor("price", vec![ParamSpec::normal("sku", ParamType::I32)]);
        assert!(matches!(
            build_key(&d, &cache_args!["42"]),
            Err(ConfigurationError::ArgumentType { index: 0, .. })
        ));
    }

    #[test]
    fn test_null_primitive_rejected() {
        let d = descriptor("price", vec![ParamSpec::normal("sku", ParamType::I32)]);
        assert!(build_key(&d, &[ParamValue::Null]).is_err());

        let d = descriptor(
            "lookup",
            vec![ParamSpec::normal("ids", ParamType::array_of(ParamType::I32))],
        );
        assert!(build_key(&d, &[ParamValue::Array(vec![ParamValue::Null])]).is_err());
    }
}
