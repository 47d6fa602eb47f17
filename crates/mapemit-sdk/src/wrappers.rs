//! Nullable scalar wrappers
//!
//! Value types in the shape data providers use for nullable columns: an
//! `IsNull` query, a `Value` accessor and a static `Null` sentinel. A zeroed
//! instance is the null sentinel, so a wrapper field is never a null reference.

use crate::builder::ClassBuilder;
use crate::convert::cast_to;
use crate::error::{Fault, ModelError};
use crate::object::ObjectRef;
use crate::types::{PropertyDef, ScalarKind, TypeRef, INULLABLE};
use crate::value::Value;

/// Name of the value accessor
pub const VALUE_MEMBER: &str = "Value";

/// Name of the absence query
pub const IS_NULL_MEMBER: &str = "IsNull";

/// Name of the null sentinel static
pub const NULL_STATIC: &str = "Null";

const VALUE_SLOT: usize = 0;
const HAS_VALUE_SLOT: usize = 1;

/// Build a nullable wrapper around `kind`
///
/// With `settable` false the `Value` property is read-only, like the provider
/// types it models.
pub fn nullable_scalar(
    name: &str,
    kind: ScalarKind,
    settable: bool,
) -> Result<TypeRef, ModelError> {
    let scalar = TypeRef::scalar(kind);
    let bool_ty = TypeRef::scalar(ScalarKind::Bool);

    let type_name = name.to_string();
    let mut value = PropertyDef::new(VALUE_MEMBER, &scalar).getter(move |obj| {
        if has_value(obj)? {
            obj.field(VALUE_SLOT)
        } else {
            Err(Fault::NullValue(type_name.clone()))
        }
    });
    if settable {
        let target = scalar.clone();
        value = value.setter(move |obj, v| store(obj, cast_to(v, &target)?));
    }

    let ctor_target = scalar.clone();
    ClassBuilder::new(name)
        .value_type()
        .implements(INULLABLE)
        .private_field("m_value", &scalar)
        .private_field("m_hasValue", &bool_ty)
        .property(
            PropertyDef::new(IS_NULL_MEMBER, &bool_ty)
                .getter(|obj| Ok(Value::Bool(!has_value(obj)?))),
        )
        .property(value)
        .constructor(vec![scalar.clone()], move |obj, args| {
            let v = args.first().cloned().unwrap_or_default();
            store(obj, cast_to(v, &ctor_target)?)
        })
        .constructor(vec![], |_, _| Ok(()))
        .static_field(NULL_STATIC, &TypeRef::any(), |ty| {
            Ok(Value::Object(ObjectRef::zeroed(ty)))
        })
        .build()
}

/// Whether `ty` has the nullable wrapper shape
pub fn is_nullable_type(ty: &TypeRef) -> bool {
    ty.implements(INULLABLE) && ty.find_property(VALUE_MEMBER).is_some() && ty.has_static(NULL_STATIC)
}

fn has_value(obj: &ObjectRef) -> Result<bool, Fault> {
    Ok(obj.field(HAS_VALUE_SLOT)?.as_bool() == Some(true))
}

fn store(obj: &ObjectRef, v: Value) -> Result<(), Fault> {
    obj.set_field(VALUE_SLOT, v)?;
    obj.set_field(HAS_VALUE_SLOT, Value::Bool(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sentinel() {
        let ty = nullable_scalar("SqlInt32", ScalarKind::I32, false).unwrap();
        assert!(is_nullable_type(&ty));

        let null = ty.static_value(NULL_STATIC).unwrap();
        let null = null.as_object().unwrap();
        assert_eq!(null.get(IS_NULL_MEMBER).unwrap(), Value::Bool(true));
        assert!(matches!(null.get(VALUE_MEMBER), Err(Fault::NullValue(_))));
    }

    #[test]
    fn test_construct_with_value() {
        let ty = nullable_scalar("SqlInt32", ScalarKind::I32, false).unwrap();
        let (index, _) = ty
            .find_constructor(&[TypeRef::scalar(ScalarKind::I32)])
            .unwrap();
        let obj = ty.construct(index, &[Value::I32(12)]).unwrap();
        assert_eq!(obj.get(IS_NULL_MEMBER).unwrap(), Value::Bool(false));
        assert_eq!(obj.get(VALUE_MEMBER).unwrap(), Value::I32(12));
    }

    #[test]
    fn test_read_only_value() {
        let ty = nullable_scalar("SqlInt32", ScalarKind::I32, false).unwrap();
        let (_, prop) = ty.find_property(VALUE_MEMBER).unwrap();
        assert!(!prop.has_setter());

        let ty = nullable_scalar("SqlInt64", ScalarKind::I64, true).unwrap();
        let obj = ty.construct(1, &[]).unwrap();
        obj.set(VALUE_MEMBER, Value::I64(5)).unwrap();
        assert_eq!(obj.get(VALUE_MEMBER).unwrap(), Value::I64(5));
    }

    #[test]
    fn test_null_sentinels_are_equal_copies() {
        let ty = nullable_scalar("SqlInt32", ScalarKind::I32, false).unwrap();
        let a = ty.static_value(NULL_STATIC).unwrap();
        let b = ty.static_value(NULL_STATIC).unwrap();
        assert_eq!(a, b);
        assert!(!a.as_object().unwrap().ptr_eq(b.as_object().unwrap()));
    }
}
