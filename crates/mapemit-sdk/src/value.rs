//! Dynamic values
//!
//! [`Value::Null`] doubles as the null reference and as the absence marker
//! exchanged with the record-mapping engine.

use crate::init_data::InitDataRef;
use crate::object::ObjectRef;
use crate::types::{ScalarKind, TypeRef};
use chrono::NaiveDateTime;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    /// Null reference / absence marker
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Character
    Char(char),
    /// i8
    I8(i8),
    /// i16
    I16(i16),
    /// i32
    I32(i32),
    /// i64
    I64(i64),
    /// u8
    U8(u8),
    /// u16
    U16(u16),
    /// u32
    U32(u32),
    /// u64
    U64(u64),
    /// f32
    F32(f32),
    /// f64
    F64(f64),
    /// Text
    Str(Arc<str>),
    /// Date and time
    DateTime(NaiveDateTime),
    /// GUID
    Guid(Uuid),
    /// Class instance
    Object(ObjectRef),
    /// Initializing-data carrier
    InitData(InitDataRef),
}

impl Value {
    /// Whether this is the null reference
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalar kind of this value, if it is a scalar
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        Some(match self {
            Value::Bool(_) => ScalarKind::Bool,
            Value::Char(_) => ScalarKind::Char,
            Value::I8(_) => ScalarKind::I8,
            Value::I16(_) => ScalarKind::I16,
            Value::I32(_) => ScalarKind::I32,
            Value::I64(_) => ScalarKind::I64,
            Value::U8(_) => ScalarKind::U8,
            Value::U16(_) => ScalarKind::U16,
            Value::U32(_) => ScalarKind::U32,
            Value::U64(_) => ScalarKind::U64,
            Value::F32(_) => ScalarKind::F32,
            Value::F64(_) => ScalarKind::F64,
            Value::Str(_) => ScalarKind::Str,
            Value::DateTime(_) => ScalarKind::DateTime,
            Value::Guid(_) => ScalarKind::Guid,
            Value::Null | Value::Object(_) | Value::InitData(_) => return None,
        })
    }

    /// Runtime type; null is typed as `Any`
    pub fn type_of(&self) -> TypeRef {
        match self {
            Value::Null => TypeRef::any(),
            Value::Object(obj) => obj.class().clone(),
            Value::InitData(_) => TypeRef::init_data(),
            other => match other.scalar_kind() {
                Some(kind) => TypeRef::scalar(kind),
                None => TypeRef::any(),
            },
        }
    }

    /// Runtime type name for diagnostics
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Object(obj) => obj.type_name().to_string(),
            other => other.type_of().name().to_string(),
        }
    }

    /// Whether the value can be baked into synthesized code as a literal
    pub fn is_embeddable(&self) -> bool {
        !matches!(self, Value::Object(_) | Value::InitData(_))
    }

    /// The value to store into a slot: value-type instances are copied
    pub fn assign_copy(&self) -> Value {
        match self {
            Value::Object(obj) if obj.class().is_value_type() => Value::Object(obj.copy()),
            other => other.clone(),
        }
    }

    /// Instance handle, if this is an object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Carrier handle, if this is initializing data
    pub fn as_init_data(&self) -> Option<&InitDataRef> {
        match self {
            Value::InitData(data) => Some(data),
            _ => None,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// Any integer payload widened to i64, if it fits
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::InitData(a), Value::InitData(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => {
                a.ptr_eq(b)
                    || (a.class().is_value_type()
                        && a.class() == b.class()
                        && a.fields_snapshot() == b.fields_snapshot())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Object(obj) => write!(f, "{:?}", obj),
            Value::InitData(data) => write!(f, "{:?}", data),
            other => write!(f, "{}({})", other.type_name(), other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Char(c) => write!(f, "{}", c),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
            Value::DateTime(d) => write!(f, "{}", d),
            Value::Guid(g) => write!(f, "{}", g),
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
            Value::InitData(_) => f.write_str("<MapInitializingData>"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Arc<str> => Str,
    NaiveDateTime => DateTime,
    Uuid => Guid,
    ObjectRef => Object,
    InitDataRef => InitData,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
