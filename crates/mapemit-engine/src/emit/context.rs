//! Per-property synthesis context

use crate::emit::plan::Params;
use crate::emit::resolver::ValueMember;
use mapemit_sdk::{PropertyDef, TypeRef};

/// Everything decided about one abstract property before its field,
/// construction plan and accessors are synthesized
pub(crate) struct PropertyContext<'a> {
    /// Type being synthesized
    pub owner: &'a TypeRef,
    /// Abstract property declaration
    pub property: &'a PropertyDef,
    /// Declared property type or the resolved `MapType` override
    pub field_type: TypeRef,
    /// Value member when the field is a wrapper
    pub wrapper: Option<ValueMember>,
    /// Construction parameters from the metadata provider
    pub params: Option<Params>,
    /// Backing field name
    pub field_name: String,
    /// Backing field slot
    pub slot: usize,
}

impl PropertyContext<'_> {
    pub fn name(&self) -> &str {
        &self.property.name
    }
}
