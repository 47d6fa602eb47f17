//! Class builder
//!
//! Consuming builder for [`ClassDef`]s. Fields declared here are appended to
//! the base class layout, so slots of inherited fields never move.

use crate::error::{FaultResult, ModelError};
use crate::object::ObjectRef;
use crate::property_info::{PropertyInfo, SetInfoFn};
use crate::types::{
    signature, ClassDef, CtorDef, FieldDef, PropertyDef, StaticDef, TypeRef,
    IMAP_SET_PROPERTY_INFO,
};
use crate::value::Value;
use std::sync::Arc;

enum PendingProperty {
    Declared(PropertyDef),
    /// Property backed by the own field at this index
    Auto(usize, PropertyDef),
}

enum PendingCtor {
    Declared(CtorDef),
    /// Public zero-argument constructor chaining to the base default constructor
    Default,
}

/// Builder for class types
pub struct ClassBuilder {
    name: String,
    base: Option<TypeRef>,
    is_abstract: bool,
    is_value_type: bool,
    is_serializable: bool,
    interfaces: Vec<String>,
    fields: Vec<FieldDef>,
    properties: Vec<PendingProperty>,
    constructors: Vec<PendingCtor>,
    statics: Vec<StaticDef>,
    set_info: Option<SetInfoFn>,
}

impl ClassBuilder {
    /// Start a new class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            is_abstract: false,
            is_value_type: false,
            is_serializable: false,
            interfaces: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            statics: Vec::new(),
            set_info: None,
        }
    }

    /// Set the base class
    pub fn extends(mut self, base: &TypeRef) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Mark as abstract
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Mark as a value type (copied on store)
    pub fn value_type(mut self) -> Self {
        self.is_value_type = true;
        self
    }

    /// Set the serializable marker
    pub fn serializable(mut self, serializable: bool) -> Self {
        self.is_serializable = serializable;
        self
    }

    /// Declare an implemented interface
    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    /// Add a public field
    pub fn field(mut self, name: impl Into<String>, ty: &TypeRef) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty: ty.clone(),
            is_public: true,
        });
        self
    }

    /// Add a non-public field
    pub fn private_field(mut self, name: impl Into<String>, ty: &TypeRef) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty: ty.clone(),
            is_public: false,
        });
        self
    }

    /// Add a property declaration
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(PendingProperty::Declared(property));
        self
    }

    /// Add a public property stored in a private field `_<name>`
    pub fn auto_property(mut self, name: impl Into<String>, ty: &TypeRef) -> Self {
        let name = name.into();
        self.fields.push(FieldDef {
            name: format!("_{}", name),
            ty: ty.clone(),
            is_public: false,
        });
        let index = self.fields.len() - 1;
        self.properties
            .push(PendingProperty::Auto(index, PropertyDef::new(name, ty)));
        self
    }

    /// Add a public constructor
    pub fn constructor<F>(mut self, params: Vec<TypeRef>, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> FaultResult<()> + Send + Sync + 'static,
    {
        self.constructors.push(PendingCtor::Declared(CtorDef {
            params,
            is_public: true,
            body: Arc::new(body),
        }));
        self
    }

    /// Add a non-public constructor
    pub fn private_constructor<F>(mut self, params: Vec<TypeRef>, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> FaultResult<()> + Send + Sync + 'static,
    {
        self.constructors.push(PendingCtor::Declared(CtorDef {
            params,
            is_public: false,
            body: Arc::new(body),
        }));
        self
    }

    /// Add a public zero-argument constructor that chains to the base one
    pub fn default_constructor(mut self) -> Self {
        self.constructors.push(PendingCtor::Default);
        self
    }

    /// Add a lazily initialized static field
    pub fn static_field<F>(mut self, name: impl Into<String>, ty: &TypeRef, init: F) -> Self
    where
        F: Fn(&TypeRef) -> FaultResult<Value> + Send + Sync + 'static,
    {
        self.statics.push(StaticDef::new(name, ty, init));
        self
    }

    /// Implement [`IMAP_SET_PROPERTY_INFO`]
    pub fn receives_property_info<F>(mut self, receiver: F) -> Self
    where
        F: Fn(&ObjectRef, &PropertyInfo, &ObjectRef) -> FaultResult<()> + Send + Sync + 'static,
    {
        self.interfaces.push(IMAP_SET_PROPERTY_INFO.to_string());
        self.set_info = Some(Arc::new(receiver));
        self
    }

    /// Validate and finish the class
    pub fn build(self) -> Result<TypeRef, ModelError> {
        let name = self.name;

        if self.is_value_type && self.is_abstract {
            return Err(ModelError::Invalid {
                ty: name,
                reason: "a value type cannot be abstract".to_string(),
            });
        }

        if let Some(base) = &self.base {
            if !base.is_reference_class() || self.is_value_type {
                return Err(ModelError::InvalidBase {
                    ty: name,
                    base: base.name().to_string(),
                });
            }
        }

        let mut layout: Vec<FieldDef> = self
            .base
            .as_ref()
            .map(|b| b.fields().to_vec())
            .unwrap_or_default();
        let declared_field_start = layout.len();

        for field in self.fields {
            if layout.iter().any(|f| f.name == field.name) {
                return Err(ModelError::DuplicateField {
                    ty: name,
                    field: field.name,
                });
            }
            layout.push(field);
        }

        let mut properties: Vec<PropertyDef> = Vec::with_capacity(self.properties.len());
        for pending in self.properties {
            let property = match pending {
                PendingProperty::Declared(p) => p,
                PendingProperty::Auto(index, p) => {
                    let slot = declared_field_start + index;
                    p.getter(move |obj| obj.field(slot))
                        .setter(move |obj, value| obj.set_field(slot, value))
                }
            };
            if properties.iter().any(|p| p.name == property.name) {
                return Err(ModelError::DuplicateProperty {
                    ty: name,
                    property: property.name,
                });
            }
            properties.push(property);
        }

        let mut constructors: Vec<CtorDef> = Vec::with_capacity(self.constructors.len());
        for pending in self.constructors {
            let ctor = match pending {
                PendingCtor::Declared(c) => c,
                PendingCtor::Default => default_ctor(self.base.as_ref()),
            };
            if constructors.iter().any(|c| c.params == ctor.params) {
                return Err(ModelError::DuplicateConstructor {
                    ty: name,
                    signature: signature(&ctor.params),
                });
            }
            constructors.push(ctor);
        }

        Ok(TypeRef::class(
            name,
            ClassDef {
                base: self.base,
                is_abstract: self.is_abstract,
                is_value_type: self.is_value_type,
                is_serializable: self.is_serializable,
                interfaces: self.interfaces,
                layout,
                declared_field_start,
                properties,
                constructors,
                statics: self.statics,
                set_info: self.set_info,
                created_members: None,
            },
        ))
    }
}

fn default_ctor(base: Option<&TypeRef>) -> CtorDef {
    let chain = base.and_then(|b| b.default_constructor().map(|(index, _)| (b.clone(), index)));
    CtorDef {
        params: Vec::new(),
        is_public: true,
        body: Arc::new(move |obj: &ObjectRef, _: &[Value]| match &chain {
            Some((base, index)) => base.invoke_constructor(*index, obj, &[]),
            None => Ok(()),
        }),
    }
}
