//! Abstract type synthesis
//!
//! Produces a concrete class extending an abstract mapped class. Every
//! abstract property gets a private backing field `_<Name>`, a construction
//! plan for that field and getter/setter bodies. The synthesized class has two
//! public constructors, at [`DEFAULT_CTOR`] and [`FACTORY_CTOR`]; both build
//! the fields, run the private init routine and then chain to the base.
//!
//! Nothing is registered until the whole type is built: an error on any
//! property drops every partial artifact.

use crate::emit::accessor::AccessorPlan;
use crate::emit::context::PropertyContext;
use crate::emit::dump::{FieldReport, PropertyReport, SynthesisReport};
use crate::emit::plan::{BaseCall, CtorKind, CtorPlan, InitRoutine, Params};
use crate::emit::planner::plan_field;
use crate::emit::resolver::resolve;
use crate::error::EmitError;
use crate::registry::{RegistryInner, Session};
use mapemit_sdk::{
    Accessor, ClassDef, CtorDef, FieldDef, ObjectRef, PropertyDef, TypeRef, Value, IMAP_GENERATED,
};
use std::sync::Arc;

/// Index of the zero-argument constructor of a synthesized type
pub const DEFAULT_CTOR: usize = 0;

/// Index of the initializing-data constructor of a synthesized type
pub const FACTORY_CTOR: usize = 1;

/// A synthesized type and its report
pub(crate) struct Synthesis {
    pub ty: TypeRef,
    /// Construction parameters by property name, fetched once
    pub parameters: Vec<(String, Params)>,
    pub report: SynthesisReport,
}

/// Build the concrete implementation of `original`
pub(crate) fn synthesize(
    registry: &Arc<RegistryInner>,
    session: &mut Session,
    original: &TypeRef,
) -> Result<Synthesis, EmitError> {
    if !original.is_class() {
        return Err(EmitError::NotAClass(original.name().to_string()));
    }

    let name = format!(
        "{}.{}.{}",
        original.name(),
        registry.options.type_name_infix,
        original.short_name()
    );

    let mut layout: Vec<FieldDef> = original.fields().to_vec();
    let declared_field_start = layout.len();
    let mut properties: Vec<PropertyDef> = Vec::new();
    let mut accessors: Vec<AccessorPlan> = Vec::new();
    let mut default_steps = Vec::new();
    let mut factory_steps = Vec::new();
    let mut init = InitRoutine::default();
    let mut owned: Vec<usize> = Vec::new();
    let mut parameters: Vec<(String, Params)> = Vec::new();

    for (_, property) in original.public_properties() {
        if !property.is_abstract() {
            continue;
        }

        let cx = property_context(registry, original, property, layout.len())?;
        if let Some(params) = &cx.params {
            parameters.push((property.name.clone(), params.clone()));
        }
        layout.push(FieldDef {
            name: cx.field_name.clone(),
            ty: cx.field_type.clone(),
            is_public: false,
        });

        if let Some(plan) = plan_field(registry, session, &cx)? {
            if plan.is_owned() {
                owned.push(cx.slot);
            }
            default_steps.extend(plan.default);
            factory_steps.extend(plan.factory);
            init.steps.extend(plan.set_info);
        }

        let accessor = AccessorPlan::new(&cx)?;
        properties.push(PropertyDef {
            name: property.name.clone(),
            ty: property.ty.clone(),
            is_public: property.is_public,
            getter: Some(Accessor::Body(accessor.getter())),
            setter: accessor.setter().map(Accessor::Body),
            attributes: property.attributes.clone(),
        });
        accessors.push(accessor);
    }

    let base_default = original.default_constructor().map(|(ctor, _)| BaseCall {
        target: original.clone(),
        ctor,
        passes_init: false,
    });
    let base_factory = original
        .find_constructor(&[TypeRef::init_data()])
        .map(|(ctor, _)| BaseCall {
            target: original.clone(),
            ctor,
            passes_init: true,
        })
        .or_else(|| base_default.clone());

    let init = Arc::new(init);
    let default_plan = Arc::new(CtorPlan {
        kind: CtorKind::Default,
        steps: default_steps,
        base: base_default,
    });
    let factory_plan = Arc::new(CtorPlan {
        kind: CtorKind::Factory,
        steps: factory_steps,
        base: base_factory,
    });

    let constructors = vec![
        synthesized_ctor(Vec::new(), &default_plan, &init),
        synthesized_ctor(vec![TypeRef::init_data()], &factory_plan, &init),
    ];

    let ty = TypeRef::class(
        name,
        ClassDef {
            base: Some(original.clone()),
            is_abstract: false,
            is_value_type: false,
            is_serializable: original.is_serializable(),
            interfaces: vec![IMAP_GENERATED.to_string()],
            layout,
            declared_field_start,
            properties,
            constructors,
            statics: Vec::new(),
            set_info: None,
            created_members: Some(owned),
        },
    );

    tracing::debug!(
        original = %original,
        synthesized = %ty,
        properties = accessors.len(),
        "synthesized concrete type"
    );

    let report = report(original, &ty, &accessors, &default_plan, &factory_plan, &init);
    Ok(Synthesis {
        ty,
        parameters,
        report,
    })
}

fn property_context<'a>(
    registry: &RegistryInner,
    owner: &'a TypeRef,
    property: &'a PropertyDef,
    slot: usize,
) -> Result<PropertyContext<'a>, EmitError> {
    let overrides = registry.provider.mapped_type_overrides(owner, property);

    let mut field_type = property.ty.clone();
    let mut wrapper = None;
    for candidate in &overrides {
        field_type = candidate.clone();
        wrapper = resolve(candidate, &property.ty);
        if wrapper.is_some() {
            break;
        }
    }

    if !overrides.is_empty() && wrapper.is_none() {
        return Err(EmitError::MissingValueMember {
            field_type: field_type.short_name().to_string(),
            property: property.name.clone(),
            owner: owner.short_name().to_string(),
        });
    }

    Ok(PropertyContext {
        owner,
        property,
        field_type,
        wrapper,
        params: registry.provider.property_parameters(owner, property),
        field_name: format!("_{}", property.name),
        slot,
    })
}

fn synthesized_ctor(params: Vec<TypeRef>, plan: &Arc<CtorPlan>, init: &Arc<InitRoutine>) -> CtorDef {
    let plan = plan.clone();
    let init = init.clone();
    CtorDef {
        params,
        is_public: true,
        body: Arc::new(move |obj: &ObjectRef, args: &[Value]| plan.run(&init, obj, args)),
    }
}

fn report(
    original: &TypeRef,
    ty: &TypeRef,
    accessors: &[AccessorPlan],
    default_plan: &CtorPlan,
    factory_plan: &CtorPlan,
    init: &InitRoutine,
) -> SynthesisReport {
    let start = ty.as_class().map_or(0, |c| c.declared_field_start);
    let fields = ty
        .fields()
        .iter()
        .enumerate()
        .skip(start)
        .map(|(slot, f)| FieldReport {
            slot,
            name: f.name.clone(),
            ty: f.ty.name().to_string(),
        })
        .collect();

    let properties = accessors
        .iter()
        .map(|a| PropertyReport {
            name: a.property.clone(),
            ty: a.property_type.name().to_string(),
            field: a.field.clone(),
            wrapper_member: a.wrapper.as_ref().map(|m| m.name.clone()),
            getter: a.describe_getter(),
            setter: a.describe_setter(),
        })
        .collect();

    let created_members = ty
        .created_member_slots()
        .unwrap_or(&[])
        .iter()
        .filter_map(|slot| ty.fields().get(*slot).map(|f| f.name.clone()))
        .collect();

    SynthesisReport {
        type_name: ty.name().to_string(),
        original: original.name().to_string(),
        serializable: ty.is_serializable(),
        fields,
        properties,
        default_constructor: default_plan.describe(init),
        factory_constructor: factory_plan.describe(init),
        init_routine: init.steps.iter().map(ToString::to_string).collect(),
        created_members,
    }
}
