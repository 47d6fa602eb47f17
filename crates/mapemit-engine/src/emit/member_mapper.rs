//! Member-mapper synthesis
//!
//! A [`MemberMapper`] is a standalone getter/setter pair for one field or
//! property of a record type, used by the record-to-object mapping engine
//! without synthesizing the whole type.
//!
//! Getters unwrap nullable wrappers: a wrapper reporting `IsNull` reads as
//! [`Value::Null`], otherwise its `Value` is returned. Setters exist only for
//! scalar, enum and nullable wrapper members.

use crate::error::EmitError;
use crate::hooks::ValueMapper;
use mapemit_sdk::{
    convert_to, is_nullable_type, signature, Fault, FaultResult, ObjectRef, ScalarKind, TypeRef,
    Value, IS_NULL_MEMBER, NULL_STATIC, VALUE_MEMBER,
};
use std::fmt;
use std::sync::Arc;

/// Kind of record member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Instance field
    Field,
    /// Property
    Property,
}

/// What to build a member mapper for
#[derive(Debug, Clone)]
pub struct MemberMapperRequest {
    /// Record type
    pub object_type: TypeRef,
    /// Member name
    pub member_name: String,
    /// Field or property
    pub kind: MemberKind,
    /// Build the getter
    pub create_get: bool,
    /// Build the setter
    pub create_set: bool,
}

impl MemberMapperRequest {
    /// Getter and setter for a property
    pub fn property(object_type: &TypeRef, name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.clone(),
            member_name: name.into(),
            kind: MemberKind::Property,
            create_get: true,
            create_set: true,
        }
    }

    /// Getter and setter for a field
    pub fn field(object_type: &TypeRef, name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.clone(),
            member_name: name.into(),
            kind: MemberKind::Field,
            create_get: true,
            create_set: true,
        }
    }

    /// Only build the getter
    pub fn get_only(mut self) -> Self {
        self.create_set = false;
        self
    }

    /// Only build the setter
    pub fn set_only(mut self) -> Self {
        self.create_get = false;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Field(usize),
    Property,
}

struct Getter {
    declaring: TypeRef,
    has_is_null: bool,
    has_value: bool,
}

enum Setter {
    Scalar(ScalarKind),
    Nullable {
        kind: ScalarKind,
        ctor: usize,
        wrapper: TypeRef,
    },
}

/// Standalone accessor pair for one record member
pub struct MemberMapper {
    object_type: TypeRef,
    member_name: String,
    member_type: TypeRef,
    access: Access,
    getter: Option<Getter>,
    setter: Option<Setter>,
    hooks: Arc<dyn ValueMapper>,
}

impl MemberMapper {
    pub(crate) fn build(
        request: &MemberMapperRequest,
        hooks: Arc<dyn ValueMapper>,
    ) -> Result<Self, EmitError> {
        let object_type = &request.object_type;
        let name = request.member_name.as_str();
        let missing = || EmitError::MissingMember {
            ty: object_type.name().to_string(),
            member: name.to_string(),
        };

        let (member_type, access, getter_owner, has_setter) = match request.kind {
            MemberKind::Field => {
                let slot = object_type.field_slot(name).ok_or_else(missing)?;
                let ty = object_type.fields()[slot].ty.clone();
                (ty, Access::Field(slot), Some(object_type.clone()), true)
            }
            MemberKind::Property => {
                let (declaring, property) = object_type.find_property(name).ok_or_else(missing)?;
                let owner = property
                    .has_getter()
                    .then(|| getter_declaring_type(object_type, &declaring, name));
                (property.ty.clone(), Access::Property, owner, property.has_setter())
            }
        };

        let getter = match (request.create_get, getter_owner) {
            (true, Some(declaring)) => Some(Getter {
                declaring,
                has_is_null: member_type.find_property(IS_NULL_MEMBER).is_some(),
                has_value: member_type.find_property(VALUE_MEMBER).is_some(),
            }),
            _ => None,
        };

        let setter = if request.create_set && has_setter {
            setter_for(&member_type)?
        } else {
            None
        };

        tracing::debug!(
            ty = %object_type,
            member = name,
            member_type = %member_type,
            get = getter.is_some(),
            set = setter.is_some(),
            "built member mapper"
        );

        Ok(Self {
            object_type: object_type.clone(),
            member_name: name.to_string(),
            member_type,
            access,
            getter,
            setter,
            hooks,
        })
    }

    /// Record type
    pub fn object_type(&self) -> &TypeRef {
        &self.object_type
    }

    /// Member name
    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    /// Declared member type
    pub fn member_type(&self) -> &TypeRef {
        &self.member_type
    }

    /// Whether a getter was built
    pub fn can_get(&self) -> bool {
        self.getter.is_some()
    }

    /// Whether a setter was built
    pub fn can_set(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the member of `source` as an external value
    pub fn get_value(&self, source: &ObjectRef) -> FaultResult<Value> {
        let getter = self.getter.as_ref().ok_or_else(|| self.missing("get"))?;
        if !source.is_instance_of(&getter.declaring) {
            return Err(Fault::TypeMismatch {
                expected: getter.declaring.name().to_string(),
                got: source.type_name().to_string(),
            });
        }

        let value = self.read(source)?;
        let value = if getter.has_is_null && is_null(&value)? {
            Value::Null
        } else if getter.has_value {
            wrapper_object(&value)?.get(VALUE_MEMBER)?
        } else {
            value
        };
        Ok(self.hooks.map_to(value))
    }

    /// Store an external value into the member of `destination`
    pub fn set_value(&self, destination: &ObjectRef, value: Value) -> FaultResult<()> {
        let setter = self.setter.as_ref().ok_or_else(|| self.missing("set"))?;
        if !destination.is_instance_of(&self.object_type) {
            return Err(Fault::TypeMismatch {
                expected: self.object_type.name().to_string(),
                got: destination.type_name().to_string(),
            });
        }

        let value = self.hooks.map_from(value);
        let value = match setter {
            Setter::Scalar(kind) => convert_to(&value, *kind)?,
            Setter::Nullable {
                kind,
                ctor,
                wrapper,
            } => {
                if value.is_null() {
                    wrapper.static_value(NULL_STATIC)?
                } else if value.as_object().is_some_and(|o| o.is_instance_of(wrapper)) {
                    value
                } else {
                    let inner = convert_to(&value, *kind)?;
                    Value::Object(wrapper.construct(*ctor, &[inner])?)
                }
            }
        };
        self.write(destination, value)
    }

    fn read(&self, source: &ObjectRef) -> FaultResult<Value> {
        match self.access {
            Access::Field(slot) => source.field(slot),
            Access::Property => source.get(&self.member_name),
        }
    }

    fn write(&self, destination: &ObjectRef, value: Value) -> FaultResult<()> {
        match self.access {
            Access::Field(slot) => destination.set_field(slot, value),
            Access::Property => destination.set(&self.member_name, value),
        }
    }

    fn missing(&self, accessor: &str) -> Fault {
        Fault::MissingMember {
            ty: self.object_type.name().to_string(),
            member: format!("{}_{}", accessor, self.member_name),
        }
    }
}

impl fmt::Debug for MemberMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMapper")
            .field("object_type", &self.object_type)
            .field("member_name", &self.member_name)
            .field("member_type", &self.member_type)
            .field("can_get", &self.can_get())
            .field("can_set", &self.can_set())
            .finish()
    }
}

/// Type the source is checked against before reading
///
/// A getter declared by a synthesized type is read through the abstract base
/// it implements.
fn getter_declaring_type(object_type: &TypeRef, declaring: &TypeRef, name: &str) -> TypeRef {
    if declaring == object_type {
        if let Some(base) = object_type.base().filter(|b| b.is_abstract()) {
            if let Some((base_declaring, _)) = base
                .find_property(name)
                .filter(|(_, p)| p.has_getter())
            {
                return base_declaring;
            }
        }
    }
    declaring.clone()
}

fn setter_for(member_type: &TypeRef) -> Result<Option<Setter>, EmitError> {
    if let Some(kind) = member_type.scalar_kind() {
        return Ok(Some(Setter::Scalar(kind)));
    }
    if let Some(kind) = member_type.enum_underlying() {
        return Ok(Some(Setter::Scalar(kind)));
    }
    if !is_nullable_type(member_type) {
        return Ok(None);
    }

    let value_type = member_type
        .find_property(VALUE_MEMBER)
        .map(|(_, p)| p.ty.clone())
        .ok_or_else(|| EmitError::MissingMember {
            ty: member_type.name().to_string(),
            member: VALUE_MEMBER.to_string(),
        })?;
    let missing_ctor = || EmitError::MissingConstructor {
        ty: member_type.name().to_string(),
        signature: signature(std::slice::from_ref(&value_type)),
    };
    let kind = value_type.scalar_kind().ok_or_else(missing_ctor)?;
    let (ctor, _) = member_type
        .find_constructor(std::slice::from_ref(&value_type))
        .ok_or_else(missing_ctor)?;

    Ok(Some(Setter::Nullable {
        kind,
        ctor,
        wrapper: member_type.clone(),
    }))
}

fn wrapper_object(value: &Value) -> FaultResult<&ObjectRef> {
    value
        .as_object()
        .ok_or_else(|| Fault::NullReference(format!("'{}' is not an object", value.type_name())))
}

fn is_null(value: &Value) -> FaultResult<bool> {
    Ok(wrapper_object(value)?.get(IS_NULL_MEMBER)?.as_bool() == Some(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::IdentityMapper;
    use mapemit_sdk::{nullable_scalar, ClassBuilder, PropertyDef};

    fn record() -> (TypeRef, TypeRef) {
        let i32_ty = TypeRef::scalar(ScalarKind::I32);
        let wrapper = nullable_scalar("SqlInt32", ScalarKind::I32, false).unwrap();
        let ty = ClassBuilder::new("Shop.Row")
            .field("Id", &i32_ty)
            .field("Quantity", &wrapper)
            .auto_property("Name", &TypeRef::scalar(ScalarKind::Str))
            .property(PropertyDef::new("Fixed", &i32_ty).getter(|_| Ok(Value::I32(7))))
            .default_constructor()
            .build()
            .unwrap();
        (ty, wrapper)
    }

    fn mapper(request: MemberMapperRequest) -> MemberMapper {
        MemberMapper::build(&request, Arc::new(IdentityMapper)).unwrap()
    }

    #[test]
    fn test_scalar_field_converts() {
        let (ty, _) = record();
        let row = ty.construct(0, &[]).unwrap();
        let id = mapper(MemberMapperRequest::field(&ty, "Id"));

        id.set_value(&row, Value::from("42")).unwrap();
        assert_eq!(id.get_value(&row).unwrap(), Value::I32(42));
    }

    #[test]
    fn test_nullable_field() {
        let (ty, wrapper) = record();
        let row = ty.construct(0, &[]).unwrap();
        let quantity = mapper(MemberMapperRequest::field(&ty, "Quantity"));

        assert_eq!(quantity.get_value(&row).unwrap(), Value::Null);

        quantity.set_value(&row, Value::I64(5)).unwrap();
        assert_eq!(quantity.get_value(&row).unwrap(), Value::I32(5));

        quantity.set_value(&row, Value::Null).unwrap();
        assert_eq!(quantity.get_value(&row).unwrap(), Value::Null);

        let boxed = wrapper.construct(0, &[Value::I32(9)]).unwrap();
        quantity.set_value(&row, Value::Object(boxed)).unwrap();
        assert_eq!(quantity.get_value(&row).unwrap(), Value::I32(9));
    }

    #[test]
    fn test_read_only_property_has_no_setter() {
        let (ty, _) = record();
        let row = ty.construct(0, &[]).unwrap();
        let fixed = mapper(MemberMapperRequest::property(&ty, "Fixed"));

        assert!(fixed.can_get());
        assert!(!fixed.can_set());
        assert_eq!(fixed.get_value(&row).unwrap(), Value::I32(7));
        assert!(fixed.set_value(&row, Value::I32(1)).is_err());
    }

    #[test]
    fn test_unsupported_member_type_has_no_setter() {
        let (row_ty, _) = record();
        let holder = ClassBuilder::new("Shop.Holder")
            .field("Row", &row_ty)
            .build()
            .unwrap();
        let row = mapper(MemberMapperRequest::field(&holder, "Row"));

        assert!(row.can_get());
        assert!(!row.can_set());
    }

    #[test]
    fn test_wrong_source_type() {
        let (ty, _) = record();
        let other = ClassBuilder::new("Shop.Other").default_constructor().build().unwrap();
        let id = mapper(MemberMapperRequest::field(&ty, "Id"));

        let err = id.get_value(&other.construct(0, &[]).unwrap()).unwrap_err();
        assert!(matches!(err, Fault::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_member() {
        let (ty, _) = record();
        let err = MemberMapper::build(
            &MemberMapperRequest::property(&ty, "Nope"),
            Arc::new(IdentityMapper),
        )
        .unwrap_err();
        assert!(matches!(err, EmitError::MissingMember { .. }));
    }
}
