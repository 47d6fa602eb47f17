//! Metadata provider boundary
//!
//! The synthesis engine never decides on its own what is mapped. It asks a
//! [`MetadataProvider`] per type and per property.

use crate::types::{PropertyAttribute, PropertyDef, TypeRef, INULLABLE};
use crate::value::Value;
use std::sync::Arc;

/// Supplies mapping metadata to the synthesis engine
pub trait MetadataProvider: Send + Sync {
    /// Whether `ty` has a mapping descriptor
    fn is_mapped(&self, ty: &TypeRef) -> bool;

    /// `MapType` overrides of `property` declared on `owner`, in declaration order
    fn mapped_type_overrides(&self, owner: &TypeRef, property: &PropertyDef) -> Vec<TypeRef>;

    /// Construction parameters of `property` declared on `owner`
    fn property_parameters(
        &self,
        owner: &TypeRef,
        property: &PropertyDef,
    ) -> Option<Arc<[Value]>>;
}

/// Provider reading [`PropertyAttribute`]s off property declarations
///
/// Every reference class that is not a nullable wrapper counts as mapped.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeMetadataProvider;

impl MetadataProvider for AttributeMetadataProvider {
    fn is_mapped(&self, ty: &TypeRef) -> bool {
        ty.is_reference_class() && !ty.implements(INULLABLE)
    }

    fn mapped_type_overrides(&self, _owner: &TypeRef, property: &PropertyDef) -> Vec<TypeRef> {
        property
            .attributes
            .iter()
            .filter_map(|a| match a {
                PropertyAttribute::MapType(ty) => Some(ty.clone()),
                PropertyAttribute::Parameters(_) => None,
            })
            .collect()
    }

    fn property_parameters(
        &self,
        _owner: &TypeRef,
        property: &PropertyDef,
    ) -> Option<Arc<[Value]>> {
        property.attributes.iter().find_map(|a| match a {
            PropertyAttribute::Parameters(values) => Some(Arc::from(values.as_slice())),
            PropertyAttribute::MapType(_) => None,
        })
    }
}
