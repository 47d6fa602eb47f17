//! Property info records pushed into fields that ask for them

use crate::error::FaultResult;
use crate::object::ObjectRef;
use crate::types::TypeRef;
use std::sync::Arc;

/// Declared type and name of the property that owns a field value
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    /// Declared property type
    pub property_type: TypeRef,
    /// Property name
    pub name: String,
}

impl PropertyInfo {
    /// Create a new record
    pub fn new(property_type: &TypeRef, name: impl Into<String>) -> Self {
        Self {
            property_type: property_type.clone(),
            name: name.into(),
        }
    }
}

/// Receiver: `(field value, info, owning object)`
pub type SetInfoFn =
    Arc<dyn Fn(&ObjectRef, &PropertyInfo, &ObjectRef) -> FaultResult<()> + Send + Sync>;
