//! Value conversion and casting
//!
//! [`convert_to`] changes the representation of a value (parsing text,
//! narrowing integers, rounding floats). [`cast_to`] never changes a value; it
//! only checks that the value may be stored where a given type is expected.

use crate::error::{Fault, FaultResult};
use crate::types::{ScalarKind, TypeKind, TypeRef};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use uuid::Uuid;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

enum Number {
    Int(i128),
    Float(f64),
}

/// Convert `value` to the scalar `kind`
///
/// Null converts to the kind's default value (text stays null). Integer
/// targets are range checked, floats are rounded half to even.
pub fn convert_to(value: &Value, kind: ScalarKind) -> FaultResult<Value> {
    if value.is_null() {
        return Ok(kind.default_value());
    }
    if value.scalar_kind() == Some(kind) {
        return Ok(value.clone());
    }

    let fail = || Fault::Conversion {
        value: format!("{:?}", value),
        target: kind.name().to_string(),
    };

    match kind {
        ScalarKind::Str => match value {
            Value::Object(_) | Value::InitData(_) => Err(fail()),
            other => Ok(Value::Str(Arc::from(other.to_string()))),
        },
        ScalarKind::Bool => match value {
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            Value::Char(_) => Err(fail()),
            other => match number(other) {
                Some(Number::Int(i)) => Ok(Value::Bool(i != 0)),
                Some(Number::Float(f)) => Ok(Value::Bool(f != 0.0)),
                None => Err(fail()),
            },
        },
        ScalarKind::Char => match value {
            Value::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(fail()),
                }
            }
            Value::Bool(_) => Err(fail()),
            other => match number(other) {
                Some(Number::Int(i)) => u32::try_from(i)
                    .ok()
                    .and_then(char::from_u32)
                    .map(Value::Char)
                    .ok_or_else(fail),
                _ => Err(fail()),
            },
        },
        ScalarKind::F32 | ScalarKind::F64 => {
            let f = match number(value) {
                Some(Number::Int(i)) => i as f64,
                Some(Number::Float(f)) => f,
                None => return Err(fail()),
            };
            Ok(if kind == ScalarKind::F32 {
                Value::F32(f as f32)
            } else {
                Value::F64(f)
            })
        }
        ScalarKind::DateTime => match value {
            Value::Str(s) => parse_datetime(s.trim()).map(Value::DateTime).ok_or_else(fail),
            _ => Err(fail()),
        },
        ScalarKind::Guid => match value {
            Value::Str(s) => Uuid::parse_str(s.trim()).map(Value::Guid).map_err(|_| fail()),
            _ => Err(fail()),
        },
        integral => {
            let i = match number(value) {
                Some(Number::Int(i)) => i,
                Some(Number::Float(f)) => float_to_int(f).ok_or_else(fail)?,
                None => return Err(fail()),
            };
            narrow(i, integral).ok_or_else(fail)
        }
    }
}

/// Check that `value` may be stored where `target` is expected
pub fn cast_to(value: Value, target: &TypeRef) -> FaultResult<Value> {
    let ok = match (target.kind(), &value) {
        (TypeKind::Any, _) => true,
        (kind, Value::Null) => {
            let holds_value = match kind {
                TypeKind::Scalar(kind) => kind.is_value_kind(),
                TypeKind::Enum(_) => true,
                TypeKind::Class(class) => class.is_value_type,
                TypeKind::Any | TypeKind::InitData => false,
            };
            if holds_value {
                return Err(Fault::NullReference(format!(
                    "null cannot be stored as {}",
                    target.name()
                )));
            }
            true
        }
        (TypeKind::Scalar(kind), v) => v.scalar_kind() == Some(*kind),
        (TypeKind::Enum(def), v) => v.scalar_kind() == Some(def.underlying),
        (TypeKind::Class(_), Value::Object(obj)) => obj.is_instance_of(target),
        (TypeKind::Class(_), _) => false,
        (TypeKind::InitData, v) => matches!(v, Value::Null | Value::InitData(_)),
    };

    if ok {
        Ok(value)
    } else {
        Err(Fault::TypeMismatch {
            expected: target.name().to_string(),
            got: value.type_name(),
        })
    }
}

fn number(value: &Value) -> Option<Number> {
    Some(match *value {
        Value::Bool(b) => Number::Int(i128::from(b)),
        Value::Char(c) => Number::Int(i128::from(u32::from(c))),
        Value::I8(v) => Number::Int(v.into()),
        Value::I16(v) => Number::Int(v.into()),
        Value::I32(v) => Number::Int(v.into()),
        Value::I64(v) => Number::Int(v.into()),
        Value::U8(v) => Number::Int(v.into()),
        Value::U16(v) => Number::Int(v.into()),
        Value::U32(v) => Number::Int(v.into()),
        Value::U64(v) => Number::Int(v.into()),
        Value::F32(v) => Number::Float(v.into()),
        Value::F64(v) => Number::Float(v),
        Value::Str(ref s) => {
            let s = s.trim();
            match s.parse::<i128>() {
                Ok(i) => Number::Int(i),
                Err(_) => Number::Float(s.parse::<f64>().ok()?),
            }
        }
        _ => return None,
    })
}

fn float_to_int(f: f64) -> Option<i128> {
    if !f.is_finite() {
        return None;
    }
    let rounded = f.round_ties_even();
    if rounded < i128::MIN as f64 || rounded >= i128::MAX as f64 {
        return None;
    }
    Some(rounded as i128)
}

fn narrow(i: i128, kind: ScalarKind) -> Option<Value> {
    Some(match kind {
        ScalarKind::I8 => Value::I8(i8::try_from(i).ok()?),
        ScalarKind::I16 => Value::I16(i16::try_from(i).ok()?),
        ScalarKind::I32 => Value::I32(i32::try_from(i).ok()?),
        ScalarKind::I64 => Value::I64(i64::try_from(i).ok()?),
        ScalarKind::U8 => Value::U8(u8::try_from(i).ok()?),
        ScalarKind::U16 => Value::U16(u16::try_from(i).ok()?),
        ScalarKind::U32 => Value::U32(u32::try_from(i).ok()?),
        ScalarKind::U64 => Value::U64(u64::try_from(i).ok()?),
        _ => return None,
    })
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_converts_to_default() {
        assert_eq!(convert_to(&Value::Null, ScalarKind::I32).unwrap(), Value::I32(0));
        assert_eq!(convert_to(&Value::Null, ScalarKind::Str).unwrap(), Value::Null);
    }

    #[test]
    fn test_integer_narrowing_is_checked() {
        assert_eq!(
            convert_to(&Value::I64(42), ScalarKind::I16).unwrap(),
            Value::I16(42)
        );
        assert!(matches!(
            convert_to(&Value::I64(70_000), ScalarKind::I16),
            Err(Fault::Conversion { .. })
        ));
        assert!(convert_to(&Value::I32(-1), ScalarKind::U32).is_err());
    }

    #[test]
    fn test_float_rounds_half_to_even() {
        assert_eq!(convert_to(&Value::F64(2.5), ScalarKind::I32).unwrap(), Value::I32(2));
        assert_eq!(convert_to(&Value::F64(3.5), ScalarKind::I32).unwrap(), Value::I32(4));
        assert!(convert_to(&Value::F64(f64::NAN), ScalarKind::I64).is_err());
    }

    #[test]
    fn test_text_parsing() {
        assert_eq!(convert_to(&Value::from("17"), ScalarKind::I64).unwrap(), Value::I64(17));
        assert_eq!(convert_to(&Value::from("True"), ScalarKind::Bool).unwrap(), Value::Bool(true));
        assert_eq!(convert_to(&Value::from("x"), ScalarKind::Char).unwrap(), Value::Char('x'));
        assert!(convert_to(&Value::from("abc"), ScalarKind::I32).is_err());

        let dt = convert_to(&Value::from("2024-03-01 10:30:00"), ScalarKind::DateTime).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(dt, Value::DateTime(expected));

        let id = Uuid::from_u128(0x1234);
        assert_eq!(
            convert_to(&Value::from(id.to_string()), ScalarKind::Guid).unwrap(),
            Value::Guid(id)
        );
    }

    #[test]
    fn test_to_text() {
        assert_eq!(convert_to(&Value::I32(5), ScalarKind::Str).unwrap(), Value::from("5"));
        assert_eq!(convert_to(&Value::Bool(false), ScalarKind::Str).unwrap(), Value::from("False"));
    }

    #[test]
    fn test_cast_checks_without_converting() {
        let i64_ty = TypeRef::scalar(ScalarKind::I64);
        assert_eq!(cast_to(Value::I64(1), &i64_ty).unwrap(), Value::I64(1));
        assert!(matches!(
            cast_to(Value::I32(1), &i64_ty),
            Err(Fault::TypeMismatch { .. })
        ));
        assert!(matches!(
            cast_to(Value::Null, &i64_ty),
            Err(Fault::NullReference(_))
        ));
        assert_eq!(
            cast_to(Value::Null, &TypeRef::scalar(ScalarKind::Str)).unwrap(),
            Value::Null
        );
        assert_eq!(cast_to(Value::I32(1), &TypeRef::any()).unwrap(), Value::I32(1));
    }

    #[test]
    fn test_cast_enum_by_underlying() {
        let color = TypeRef::enumeration("Color", ScalarKind::I32, vec![("Red".into(), 0)]);
        assert!(cast_to(Value::I32(0), &color).is_ok());
        assert!(cast_to(Value::I64(0), &color).is_err());
    }
}
