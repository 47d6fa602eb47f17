//! Integration tests for abstract type synthesis
//!
//! Covers backing fields and accessors, field construction through
//! parameters, nested descriptors and the init routine, and the configuration
//! errors that abort synthesis.

use mapemit_engine::{EmitError, MapRegistry, DEFAULT_CTOR, FACTORY_CTOR};
use mapemit_sdk::{
    nullable_scalar, AttributeMetadataProvider, ClassBuilder, Fault, InitDataRef,
    MetadataProvider, PropertyDef, ScalarKind, TypeRef, Value, IMAP_GENERATED,
};
use proptest::prelude::*;
use std::sync::Arc;

fn scalar(kind: ScalarKind) -> TypeRef {
    TypeRef::scalar(kind)
}

fn registry() -> MapRegistry {
    MapRegistry::new(AttributeMetadataProvider)
}

/// Abstract mapped class with only plain scalar properties
fn person() -> TypeRef {
    ClassBuilder::new("Shop.Person")
        .abstract_class()
        .serializable(true)
        .property(PropertyDef::new("Name", &scalar(ScalarKind::Str)).abstract_accessors())
        .property(PropertyDef::new("Age", &scalar(ScalarKind::I32)).abstract_accessors())
        .property(PropertyDef::new("Score", &scalar(ScalarKind::F64)).abstract_accessors())
        .property(PropertyDef::new("Active", &scalar(ScalarKind::Bool)).abstract_accessors())
        .default_constructor()
        .build()
        .unwrap()
}

/// Abstract class whose `(InitData)` constructor records the member parameters
fn recorder(name: &str) -> TypeRef {
    let any = TypeRef::any();
    ClassBuilder::new(name)
        .abstract_class()
        .field("First", &any)
        .field("Second", &any)
        .field("Count", &scalar(ScalarKind::I32))
        .constructor(vec![TypeRef::init_data()], |obj, args| {
            let params = args
                .first()
                .and_then(Value::as_init_data)
                .and_then(|init| init.member_parameters());
            if let Some(params) = params {
                obj.set_field_by_name("Count", Value::I32(params.len() as i32))?;
                obj.set_field_by_name("First", params.first().cloned().unwrap_or_default())?;
                obj.set_field_by_name("Second", params.get(1).cloned().unwrap_or_default())?;
            }
            Ok(())
        })
        .default_constructor()
        .build()
        .unwrap()
}

// ===== Shape of the synthesized type =====

#[test]
fn test_synthesized_type_shape() {
    let registry = registry();
    let ty = person();
    let descriptor = registry.descriptor(&ty).unwrap();
    let mapped = descriptor.mapped_type();

    assert!(descriptor.is_synthesized());
    assert_eq!(mapped.name(), "Shop.Person.MappingExtension.Person");
    assert_eq!(mapped.base(), Some(&ty));
    assert!(!mapped.is_abstract());
    assert!(mapped.is_serializable());
    assert!(mapped.implements(IMAP_GENERATED));

    let fields: Vec<&str> = mapped.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, ["_Name", "_Age", "_Score", "_Active"]);
    assert!(mapped.fields().iter().all(|f| !f.is_public));

    let ctors = mapped.constructors();
    assert_eq!(ctors.len(), 2);
    assert!(ctors[DEFAULT_CTOR].params.is_empty());
    assert_eq!(ctors[FACTORY_CTOR].params, vec![TypeRef::init_data()]);
    assert!(ctors.iter().all(|c| c.is_public));
}

#[test]
fn test_instance_is_usable_as_original() {
    let registry = registry();
    let ty = person();
    let obj = registry.descriptor(&ty).unwrap().create_instance().unwrap();

    assert!(obj.is_instance_of(&ty));
    assert_eq!(obj.get("Age").unwrap(), Value::I32(0));
    assert_eq!(obj.get("Name").unwrap(), Value::Null);
    assert!(obj.created_members().unwrap().is_empty());
}

#[test]
fn test_setter_rejects_wrong_type() {
    let registry = registry();
    let obj = registry
        .descriptor(&person())
        .unwrap()
        .create_instance()
        .unwrap();

    let err = obj.set("Age", Value::from("old")).unwrap_err();
    assert!(matches!(err, Fault::TypeMismatch { .. }));
}

#[test]
fn test_concrete_members_are_kept() {
    let str_ty = scalar(ScalarKind::Str);
    let ty = ClassBuilder::new("Shop.Labelled")
        .abstract_class()
        .property(PropertyDef::new("Label", &str_ty).abstract_accessors())
        .property(PropertyDef::new("Kind", &str_ty).getter(|_| Ok(Value::from("fixed"))))
        .default_constructor()
        .build()
        .unwrap();
    let registry = registry();
    let obj = registry.descriptor(&ty).unwrap().create_instance().unwrap();

    assert_eq!(obj.get("Kind").unwrap(), Value::from("fixed"));
    let fields: Vec<String> = obj.class().fields().iter().map(|f| f.name.clone()).collect();
    assert_eq!(fields, ["_Label"]);
}

proptest! {
    #[test]
    fn prop_scalar_properties_round_trip(
        name in "[a-zA-Z ]{0,16}",
        age in any::<i32>(),
        score in -1.0e9f64..1.0e9,
        active in any::<bool>(),
    ) {
        let registry = registry();
        let obj = registry.descriptor(&person()).unwrap().create_instance().unwrap();

        obj.set("Name", Value::from(name.as_str())).unwrap();
        obj.set("Age", Value::I32(age)).unwrap();
        obj.set("Score", Value::F64(score)).unwrap();
        obj.set("Active", Value::Bool(active)).unwrap();

        prop_assert_eq!(obj.get("Name").unwrap(), Value::from(name.as_str()));
        prop_assert_eq!(obj.get("Age").unwrap(), Value::I32(age));
        prop_assert_eq!(obj.get("Score").unwrap(), Value::F64(score));
        prop_assert_eq!(obj.get("Active").unwrap(), Value::Bool(active));
    }
}

// ===== Wrapper-typed properties =====

#[test]
fn test_property_through_settable_wrapper() {
    let wrapper = nullable_scalar("Data.Int32Box", ScalarKind::I32, true).unwrap();
    let ty = ClassBuilder::new("Shop.Stock")
        .abstract_class()
        .property(
            PropertyDef::new("Quantity", &scalar(ScalarKind::I32))
                .abstract_accessors()
                .map_type(&wrapper),
        )
        .build()
        .unwrap();
    let registry = registry();
    let descriptor = registry.descriptor(&ty).unwrap();
    let obj = descriptor.create_instance().unwrap();

    assert_eq!(descriptor.mapped_type().fields()[0].ty, wrapper);
    obj.set("Quantity", Value::I32(12)).unwrap();
    assert_eq!(obj.get("Quantity").unwrap(), Value::I32(12));

    let report = descriptor.report().unwrap();
    assert_eq!(report.properties[0].wrapper_member.as_deref(), Some("Value"));
}

#[test]
fn test_read_only_wrapper_omits_setter() {
    let wrapper = nullable_scalar("Data.SqlInt32", ScalarKind::I32, false).unwrap();
    let ty = ClassBuilder::new("Shop.Invoice")
        .abstract_class()
        .property(
            PropertyDef::new("Lines", &scalar(ScalarKind::I32))
                .abstract_getter()
                .map_type(&wrapper),
        )
        .build()
        .unwrap();
    let registry = registry();
    let descriptor = registry.descriptor(&ty).unwrap();

    let (_, property) = descriptor.mapped_type().find_property("Lines").unwrap();
    assert!(property.has_getter());
    assert!(!property.has_setter());

    let obj = descriptor.create_instance().unwrap();
    assert!(matches!(obj.get("Lines"), Err(Fault::NullValue(_))));
}

#[test]
fn test_read_only_wrapper_with_declared_setter_fails() {
    let wrapper = nullable_scalar("Data.SqlInt32", ScalarKind::I32, false).unwrap();
    let ty = ClassBuilder::new("Shop.Invoice")
        .abstract_class()
        .property(
            PropertyDef::new("Lines", &scalar(ScalarKind::I32))
                .abstract_accessors()
                .map_type(&wrapper),
        )
        .build()
        .unwrap();

    let err = registry().descriptor(&ty).unwrap_err();
    assert!(matches!(err, EmitError::ReadOnlyValueMember { .. }));
}

#[test]
fn test_override_without_value_member_fails() {
    let wrapper = nullable_scalar("Data.SqlInt32", ScalarKind::I32, true).unwrap();
    let ty = ClassBuilder::new("Shop.Ledger")
        .abstract_class()
        .property(
            PropertyDef::new("Total", &scalar(ScalarKind::I64))
                .abstract_accessors()
                .map_type(&wrapper),
        )
        .build()
        .unwrap();
    let registry = registry();

    let err = registry.descriptor(&ty).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The 'SqlInt32' type does not have appropriate setter or getter member. \
         See 'Total' member of 'Ledger' type."
    );
    assert!(!registry.is_cached(&ty));
}

#[test]
fn test_first_resolvable_override_wins() {
    let narrow = nullable_scalar("Data.SqlInt32", ScalarKind::I32, true).unwrap();
    let wide = nullable_scalar("Data.SqlInt64", ScalarKind::I64, true).unwrap();
    let ty = ClassBuilder::new("Shop.Ledger")
        .abstract_class()
        .property(
            PropertyDef::new("Total", &scalar(ScalarKind::I64))
                .abstract_accessors()
                .map_type(&narrow)
                .map_type(&wide),
        )
        .build()
        .unwrap();

    let descriptor = registry().descriptor(&ty).unwrap();
    assert_eq!(descriptor.mapped_type().fields()[0].ty, wide);
}

// ===== Field construction =====

#[test]
fn test_parameters_reach_factory_constructor_in_order() {
    let child = recorder("Shop.Part");
    let ty = ClassBuilder::new("Shop.Assembly")
        .abstract_class()
        .property(
            PropertyDef::new("Part", &child)
                .abstract_accessors()
                .parameters(vec![Value::I32(1), Value::from("x")]),
        )
        .default_constructor()
        .build()
        .unwrap();
    let registry = registry();
    let descriptor = registry.descriptor(&ty).unwrap();

    assert_eq!(
        descriptor.property_parameters("Part"),
        Some(&[Value::I32(1), Value::from("x")][..])
    );

    let obj = descriptor.create_instance().unwrap();
    let part = obj.get("Part").unwrap();
    let part = part.as_object().unwrap();

    assert!(part.is_instance_of(&child));
    assert_eq!(part.field_by_name("Count").unwrap(), Value::I32(2));
    assert_eq!(part.field_by_name("First").unwrap(), Value::I32(1));
    assert_eq!(part.field_by_name("Second").unwrap(), Value::from("x"));
    assert_eq!(obj.created_members().unwrap(), vec![Value::Object(part.clone())]);
}

#[test]
fn test_factory_construction_clears_parameters() {
    let child = recorder("Shop.Part");
    let ty = ClassBuilder::new("Shop.Assembly")
        .abstract_class()
        .property(
            PropertyDef::new("Part", &child)
                .abstract_accessors()
                .parameters(vec![Value::from("left")]),
        )
        .build()
        .unwrap();
    let registry = registry();
    let init = InitDataRef::new();

    let obj = registry
        .descriptor(&ty)
        .unwrap()
        .create_instance_with(&init)
        .unwrap();

    let part = obj.get("Part").unwrap();
    let part = part.as_object().unwrap();
    assert_eq!(part.field_by_name("First").unwrap(), Value::from("left"));
    assert!(init.member_parameters().is_none());
}

#[test]
fn test_parameters_select_matching_constructor() {
    let str_ty = scalar(ScalarKind::Str);
    let tag = ClassBuilder::new("Shop.Tag")
        .field("Text", &str_ty)
        .field("Weight", &scalar(ScalarKind::I32))
        .constructor(vec![str_ty.clone(), scalar(ScalarKind::I32)], |obj, args| {
            obj.set_field_by_name("Text", args[0].clone())?;
            obj.set_field_by_name("Weight", args[1].clone())
        })
        .default_constructor()
        .build()
        .unwrap();
    let ty = ClassBuilder::new("Shop.Tagged")
        .abstract_class()
        .property(
            PropertyDef::new("Tag", &tag)
                .abstract_accessors()
                .parameters(vec![Value::from("sale"), Value::I32(3)]),
        )
        .build()
        .unwrap();
    let registry = registry();
    let descriptor = registry.descriptor(&ty).unwrap();

    for obj in [
        descriptor.create_instance().unwrap(),
        descriptor.create_instance_with(&InitDataRef::new()).unwrap(),
    ] {
        let tag = obj.get("Tag").unwrap();
        let tag = tag.as_object().unwrap();
        assert_eq!(tag.field_by_name("Text").unwrap(), Value::from("sale"));
        assert_eq!(tag.field_by_name("Weight").unwrap(), Value::I32(3));
    }
}

#[test]
fn test_abstract_field_without_parameters_is_synthesized_eagerly() {
    let owner = ClassBuilder::new("Shop.Owner")
        .abstract_class()
        .property(PropertyDef::new("Name", &scalar(ScalarKind::Str)).abstract_accessors())
        .default_constructor()
        .build()
        .unwrap();
    let ty = ClassBuilder::new("Shop.Account")
        .abstract_class()
        .property(PropertyDef::new("Owner", &owner).abstract_accessors())
        .build()
        .unwrap();
    let registry = registry();

    let obj = registry.descriptor(&ty).unwrap().create_instance().unwrap();

    assert!(registry.is_cached(&owner));
    assert_eq!(registry.synthesized_count(), 2);
    let nested = obj.get("Owner").unwrap();
    let nested = nested.as_object().unwrap();
    assert!(nested.is_instance_of(&owner));
    nested.set("Name", Value::from("Ada")).unwrap();
    assert_eq!(nested.get("Name").unwrap(), Value::from("Ada"));
}

#[test]
fn test_abstract_field_with_parameters_fails_when_nested_type_fails() {
    let wrapper = nullable_scalar("Data.SqlInt32", ScalarKind::I32, true).unwrap();
    let nested = ClassBuilder::new("Shop.Ledger")
        .abstract_class()
        .property(
            PropertyDef::new("Total", &scalar(ScalarKind::I64))
                .abstract_accessors()
                .map_type(&wrapper),
        )
        .constructor(vec![TypeRef::init_data()], |_, _| Ok(()))
        .default_constructor()
        .build()
        .unwrap();
    let ty = ClassBuilder::new("Shop.Branch")
        .abstract_class()
        .property(
            PropertyDef::new("Ledger", &nested)
                .abstract_accessors()
                .parameters(vec![Value::I32(1), Value::from("x")]),
        )
        .default_constructor()
        .build()
        .unwrap();
    let registry = registry();

    let err = registry.descriptor(&ty).unwrap_err();
    assert!(matches!(err, EmitError::MissingValueMember { .. }));
    assert!(!registry.is_cached(&ty));
    assert!(!registry.is_cached(&nested));
    assert_eq!(registry.cached_count(), 0);
}

#[test]
fn test_missing_default_constructor() {
    let widget = ClassBuilder::new("Shop.Widget")
        .private_constructor(vec![], |_, _| Ok(()))
        .build()
        .unwrap();
    let ty = ClassBuilder::new("Shop.Gadget")
        .abstract_class()
        .property(PropertyDef::new("Widget", &widget).abstract_accessors())
        .build()
        .unwrap();

    let err = registry().descriptor(&ty).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The 'Widget' type has to have public default constructor."
    );
}

#[test]
fn test_failed_synthesis_publishes_nothing() {
    let owner = ClassBuilder::new("Shop.Owner")
        .abstract_class()
        .default_constructor()
        .build()
        .unwrap();
    let widget = ClassBuilder::new("Shop.Widget")
        .private_constructor(vec![], |_, _| Ok(()))
        .build()
        .unwrap();
    let ty = ClassBuilder::new("Shop.Gadget")
        .abstract_class()
        .property(PropertyDef::new("Owner", &owner).abstract_accessors())
        .property(PropertyDef::new("Widget", &widget).abstract_accessors())
        .build()
        .unwrap();
    let registry = registry();

    assert!(matches!(
        registry.descriptor(&ty),
        Err(EmitError::MissingDefaultConstructor(_))
    ));
    assert!(!registry.is_cached(&ty));
    assert!(!registry.is_cached(&owner));
    assert_eq!(registry.synthesized_count(), 0);
    assert_eq!(registry.cached_count(), 0);
}

/// Maps the `Next` property of every class onto the class itself
struct SelfLinking;

impl MetadataProvider for SelfLinking {
    fn is_mapped(&self, ty: &TypeRef) -> bool {
        AttributeMetadataProvider.is_mapped(ty)
    }

    fn mapped_type_overrides(&self, owner: &TypeRef, property: &PropertyDef) -> Vec<TypeRef> {
        if property.name == "Next" {
            vec![owner.clone()]
        } else {
            Vec::new()
        }
    }

    fn property_parameters(&self, _: &TypeRef, _: &PropertyDef) -> Option<Arc<[Value]>> {
        None
    }
}

#[test]
fn test_self_reference_is_cyclic() {
    let str_ty = scalar(ScalarKind::Str);
    let node = ClassBuilder::new("Shop.Node")
        .abstract_class()
        .property(PropertyDef::new("Value", &str_ty).abstract_accessors())
        .property(PropertyDef::new("Next", &str_ty).abstract_accessors())
        .build()
        .unwrap();
    let registry = MapRegistry::new(SelfLinking);

    let err = registry.descriptor(&node).unwrap_err();
    assert!(matches!(err, EmitError::CyclicSynthesis(name) if name == "Shop.Node"));
    assert!(!registry.is_cached(&node));
}

#[test]
fn test_property_info_is_pushed_after_construction() {
    let tracker = ClassBuilder::new("Shop.Tracker")
        .field("Label", &scalar(ScalarKind::Str))
        .field("Owner", &scalar(ScalarKind::Str))
        .receives_property_info(|field, info, owner| {
            field.set_field_by_name(
                "Label",
                Value::from(format!("{} {}", info.property_type, info.name)),
            )?;
            field.set_field_by_name("Owner", Value::from(owner.type_name()))
        })
        .default_constructor()
        .build()
        .unwrap();
    let ty = ClassBuilder::new("Shop.Order")
        .abstract_class()
        .property(PropertyDef::new("Changes", &tracker).abstract_accessors())
        .build()
        .unwrap();
    let registry = registry();
    let descriptor = registry.descriptor(&ty).unwrap();

    for obj in [
        descriptor.create_instance().unwrap(),
        descriptor.create_instance_with(&InitDataRef::new()).unwrap(),
    ] {
        let changes = obj.get("Changes").unwrap();
        let changes = changes.as_object().unwrap();
        assert_eq!(
            changes.field_by_name("Label").unwrap(),
            Value::from("Shop.Tracker Changes")
        );
        assert_eq!(
            changes.field_by_name("Owner").unwrap(),
            Value::from("Shop.Order.MappingExtension.Order")
        );
    }
    assert_eq!(descriptor.report().unwrap().init_routine.len(), 1);
}

#[test]
fn test_unmapped_field_type_is_left_alone() {
    let wrapper = nullable_scalar("Data.SqlInt32", ScalarKind::I32, true).unwrap();
    let ty = ClassBuilder::new("Shop.Row")
        .abstract_class()
        .property(PropertyDef::new("Amount", &wrapper).abstract_accessors())
        .build()
        .unwrap();
    let registry = registry();
    let obj = registry.descriptor(&ty).unwrap().create_instance().unwrap();

    assert!(obj.created_members().unwrap().is_empty());
    let amount = obj.get("Amount").unwrap();
    assert_eq!(
        amount.as_object().unwrap().get("IsNull").unwrap(),
        Value::Bool(true)
    );
}
