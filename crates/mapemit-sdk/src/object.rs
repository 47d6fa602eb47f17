//! Object instances
//!
//! An [`ObjectRef`] is a shared handle to a class instance. Instances of
//! value-type classes are copied whenever they are stored into a field, so two
//! fields never alias the same value-type instance.

use crate::error::{Fault, FaultResult};
use crate::types::TypeRef;
use crate::value::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Instance storage
pub struct Object {
    class: TypeRef,
    fields: RwLock<Vec<Value>>,
}

/// Shared handle to an instance
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    /// Instance of `class` with every field at its default value and no constructor run
    pub(crate) fn zeroed(class: &TypeRef) -> Self {
        let fields = class.fields().iter().map(|f| f.ty.default_value()).collect();
        Self(Arc::new(Object {
            class: class.clone(),
            fields: RwLock::new(fields),
        }))
    }

    /// Runtime class
    pub fn class(&self) -> &TypeRef {
        &self.0.class
    }

    /// Runtime class name
    pub fn type_name(&self) -> &str {
        self.0.class.name()
    }

    /// Read field `slot`
    pub fn field(&self, slot: usize) -> FaultResult<Value> {
        self.0
            .fields
            .read()
            .get(slot)
            .cloned()
            .ok_or_else(|| self.bad_slot(slot))
    }

    /// Store into field `slot`
    pub fn set_field(&self, slot: usize, value: Value) -> FaultResult<()> {
        let value = value.assign_copy();
        let mut fields = self.0.fields.write();
        match fields.get_mut(slot) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(self.bad_slot(slot)),
        }
    }

    /// Read a field by name
    pub fn field_by_name(&self, name: &str) -> FaultResult<Value> {
        let slot = self.slot_of(name)?;
        self.field(slot)
    }

    /// Store into a field by name
    pub fn set_field_by_name(&self, name: &str, value: Value) -> FaultResult<()> {
        let slot = self.slot_of(name)?;
        self.set_field(slot, value)
    }

    /// Read a property through the most derived getter
    pub fn get(&self, property: &str) -> FaultResult<Value> {
        let getter = self.0.class.getter_for(property)?;
        getter(self)
    }

    /// Write a property through the most derived setter
    pub fn set(&self, property: &str, value: Value) -> FaultResult<()> {
        let setter = self.0.class.setter_for(property)?;
        setter(self, value)
    }

    /// Whether this instance can be used where `ty` is expected
    pub fn is_instance_of(&self, ty: &TypeRef) -> bool {
        self.0.class.is_assignable_to(ty)
    }

    /// Objects owned by a synthesized instance, in synthesis order
    pub fn created_members(&self) -> FaultResult<Vec<Value>> {
        let slots = self.0.class.created_member_slots().unwrap_or(&[]);
        slots.iter().map(|slot| self.field(*slot)).collect()
    }

    /// Whether both handles point to the same instance
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Independent copy; nested value-type fields are copied too
    pub fn copy(&self) -> ObjectRef {
        let fields = self.0.fields.read().iter().map(Value::assign_copy).collect();
        Self(Arc::new(Object {
            class: self.0.class.clone(),
            fields: RwLock::new(fields),
        }))
    }

    /// Snapshot of all field values
    pub fn fields_snapshot(&self) -> Vec<Value> {
        self.0.fields.read().clone()
    }

    fn slot_of(&self, name: &str) -> FaultResult<usize> {
        self.0
            .class
            .field_slot(name)
            .ok_or_else(|| Fault::MissingMember {
                ty: self.type_name().to_string(),
                member: name.to_string(),
            })
    }

    fn bad_slot(&self, index: usize) -> Fault {
        Fault::FieldIndex {
            ty: self.type_name().to_string(),
            index,
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({})", self.type_name())
    }
}
