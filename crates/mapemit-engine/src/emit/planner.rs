//! Field construction planning
//!
//! Decides, for every backing field whose type is a mapped reference class,
//! how both synthesized constructors produce its value:
//!
//! - abstract field type: delegate to the field type's descriptor
//! - concrete field type: a constructor matching the attribute parameters,
//!   then a factory constructor, then a zero-argument constructor
//! - whatever the above left open in the default constructor falls back to the
//!   public default constructor of the construction target

use crate::emit::context::PropertyContext;
use crate::emit::plan::{
    Carrier, ConstructField, DescriptorLookup, FieldSource, Operand, SetPropertyInfo,
};
use crate::error::EmitError;
use crate::registry::{RegistryInner, Session};
use mapemit_sdk::{PropertyInfo, TypeRef, Value, IMAP_SET_PROPERTY_INFO};
use std::sync::Arc;

/// Construction decided for one field
pub(crate) struct FieldPlan {
    /// Step for the zero-argument constructor
    pub default: Option<ConstructField>,
    /// Step for the factory constructor
    pub factory: Option<ConstructField>,
    /// Property info pushed by the init routine
    pub set_info: Option<SetPropertyInfo>,
}

impl FieldPlan {
    /// Whether any construction code was planned
    pub fn is_owned(&self) -> bool {
        self.default.is_some() || self.factory.is_some()
    }
}

/// Plan the field of `cx`; `None` when the field is left to default initialization
pub(crate) fn plan_field(
    registry: &Arc<RegistryInner>,
    session: &mut Session,
    cx: &PropertyContext<'_>,
) -> Result<Option<FieldPlan>, EmitError> {
    let field_type = &cx.field_type;
    if !field_type.is_reference_class() || !registry.provider.is_mapped(field_type) {
        return Ok(None);
    }

    let step = |source: FieldSource| ConstructField {
        property: cx.name().to_string(),
        slot: cx.slot,
        field_type: field_type.clone(),
        params: cx.params.clone(),
        source,
    };

    let mut default = None;
    let mut factory = None;

    // Abstract field types must synthesize now, whichever constructor path is taken.
    let nested = if field_type.is_abstract() {
        Some(registry.descriptor_in(session, field_type)?)
    } else {
        None
    };

    if field_type.is_abstract() {
        let lookup = Arc::new(DescriptorLookup::new(field_type, Arc::downgrade(registry)));
        factory = Some(step(FieldSource::Descriptor {
            lookup: lookup.clone(),
            carrier: Carrier::Argument,
        }));
        if cx.params.is_some() {
            default = Some(step(FieldSource::Descriptor {
                lookup,
                carrier: Carrier::Transient,
            }));
        }
    } else {
        let with_params = cx.params.as_ref().and_then(|params| {
            let types: Vec<TypeRef> = params.iter().map(Value::type_of).collect();
            let (ctor, _) = field_type.find_constructor(&types)?;
            let args: Vec<Operand> = params
                .iter()
                .zip(&types)
                .enumerate()
                .map(|(index, (value, ty))| {
                    if value.is_embeddable() {
                        Operand::Literal(value.clone())
                    } else {
                        Operand::Param {
                            index,
                            ty: ty.clone(),
                        }
                    }
                })
                .collect();
            Some((ctor, args))
        });

        if let Some((ctor, args)) = with_params {
            default = Some(step(FieldSource::New {
                target: field_type.clone(),
                ctor,
                args: args.clone(),
            }));
            factory = Some(step(FieldSource::New {
                target: field_type.clone(),
                ctor,
                args,
            }));
        } else if let Some((ctor, _)) = field_type.find_constructor(&[TypeRef::init_data()]) {
            factory = Some(step(FieldSource::NewWithInitData {
                target: field_type.clone(),
                ctor,
                carrier: Carrier::Argument,
            }));
            if cx.params.is_some() {
                default = Some(step(FieldSource::NewWithInitData {
                    target: field_type.clone(),
                    ctor,
                    carrier: Carrier::Transient,
                }));
            }
        } else if let Some((ctor, _)) = field_type.default_constructor() {
            factory = Some(step(FieldSource::New {
                target: field_type.clone(),
                ctor,
                args: Vec::new(),
            }));
        }
    }

    if default.is_none() {
        let target = match &nested {
            Some(descriptor) => descriptor.mapped_type().clone(),
            None => field_type.clone(),
        };
        let ctor = target
            .default_constructor()
            .filter(|(_, c)| c.is_public)
            .map(|(ctor, _)| ctor)
            .ok_or_else(|| {
                EmitError::MissingDefaultConstructor(field_type.short_name().to_string())
            })?;
        default = Some(step(FieldSource::New {
            target,
            ctor,
            args: Vec::new(),
        }));
    }

    let set_info = field_type
        .implements(IMAP_SET_PROPERTY_INFO)
        .then(|| SetPropertyInfo {
            field: cx.field_name.clone(),
            slot: cx.slot,
            info: PropertyInfo::new(&cx.property.ty, cx.name()),
        });

    tracing::debug!(
        owner = %cx.owner,
        property = cx.name(),
        field_type = %field_type,
        "planned field construction"
    );

    Ok(Some(FieldPlan {
        default,
        factory,
        set_info,
    }))
}
