//! Accessor synthesis
//!
//! Getter and setter bodies for one abstract property, bridging the declared
//! property type and the backing field type.

use crate::emit::context::PropertyContext;
use crate::emit::resolver::ValueMember;
use crate::error::EmitError;
use mapemit_sdk::{cast_to, GetterFn, ObjectRef, SetterFn, TypeRef, Value};
use std::sync::Arc;

/// Shape of the synthesized setter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetterShape {
    /// No setter: read-only wrapper and no declared setter
    Omitted,
    /// Store into the backing field
    Direct,
    /// Write through the wrapper's value member
    ThroughWrapper,
}

/// Decided accessors of one property
#[derive(Debug, Clone)]
pub struct AccessorPlan {
    /// Property name
    pub property: String,
    /// Declared property type
    pub property_type: TypeRef,
    /// Backing field name
    pub field: String,
    /// Backing field slot
    pub slot: usize,
    /// Value member when the field is a wrapper
    pub wrapper: Option<ValueMember>,
    /// Setter shape
    pub setter: SetterShape,
}

impl AccessorPlan {
    /// Decide the accessors for `cx`
    pub(crate) fn new(cx: &PropertyContext<'_>) -> Result<Self, EmitError> {
        let setter = match &cx.wrapper {
            None => SetterShape::Direct,
            Some(member) if member.is_writable() => SetterShape::ThroughWrapper,
            Some(_) if !cx.property.has_setter() => SetterShape::Omitted,
            Some(member) => {
                return Err(EmitError::ReadOnlyValueMember {
                    wrapper: cx.field_type.short_name().to_string(),
                    member: member.name.clone(),
                    property: cx.name().to_string(),
                    owner: cx.owner.short_name().to_string(),
                })
            }
        };

        Ok(Self {
            property: cx.name().to_string(),
            property_type: cx.property.ty.clone(),
            field: cx.field_name.clone(),
            slot: cx.slot,
            wrapper: cx.wrapper.clone(),
            setter,
        })
    }

    /// Getter body
    pub fn getter(&self) -> GetterFn {
        let slot = self.slot;
        let property_type = self.property_type.clone();
        match self.wrapper.clone() {
            None => Arc::new(move |obj: &ObjectRef| obj.field(slot)),
            Some(member) => {
                let adjust = member.ty != property_type && !property_type.is_enum();
                Arc::new(move |obj: &ObjectRef| {
                    let value = member.read(&obj.field(slot)?)?;
                    if adjust {
                        cast_to(value, &property_type)
                    } else {
                        Ok(value)
                    }
                })
            }
        }
    }

    /// Setter body, unless omitted
    pub fn setter(&self) -> Option<SetterFn> {
        let slot = self.slot;
        let property_type = self.property_type.clone();
        match (self.setter, self.wrapper.clone()) {
            (SetterShape::Omitted, _) => None,
            (SetterShape::ThroughWrapper, Some(member)) => Some(Arc::new(move |obj: &ObjectRef, value: Value| {
                let value = cast_to(value, &property_type)?;
                member.write(&obj.field(slot)?, value)
            })),
            _ => Some(Arc::new(move |obj: &ObjectRef, value: Value| {
                obj.set_field(slot, cast_to(value, &property_type)?)
            })),
        }
    }

    /// Getter rendered for the dump
    pub fn describe_getter(&self) -> String {
        match &self.wrapper {
            None => format!("return this.{}", self.field),
            Some(m) if m.ty != self.property_type && !self.property_type.is_enum() => {
                format!("return this.{}.{} as {}", self.field, m.name, self.property_type)
            }
            Some(m) => format!("return this.{}.{}", self.field, m.name),
        }
    }

    /// Setter rendered for the dump
    pub fn describe_setter(&self) -> Option<String> {
        match (self.setter, &self.wrapper) {
            (SetterShape::Omitted, _) => None,
            (SetterShape::ThroughWrapper, Some(m)) => {
                Some(format!("this.{}.{} = value", self.field, m.name))
            }
            _ => Some(format!("this.{} = value", self.field)),
        }
    }
}
