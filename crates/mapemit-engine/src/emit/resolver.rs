//! Value member resolution
//!
//! Given a wrapper type and the scalar type a property exposes, find the
//! member of the wrapper that actually holds the value. Fields are searched
//! before properties; within each group the ranks are tried in order and the
//! first candidate in declaration order wins:
//!
//! 1. a member named `Value` of a matching type
//! 2. any member of a matching type
//! 3. a member named `Value` whose type is a base of the desired type; the
//!    root `Any` type does not count as a base here
//!
//! A miss means the type is not a wrapper. Callers store the value directly.

use mapemit_sdk::{Fault, FaultResult, ObjectRef, TypeKind, TypeRef, Value, VALUE_MEMBER};

/// Where the resolved member lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueMemberKind {
    /// Instance field
    Field {
        /// Slot in the wrapper layout
        slot: usize,
    },
    /// Property
    Property {
        /// A getter is declared
        readable: bool,
        /// A setter is declared
        writable: bool,
    },
}

/// Member holding the value of a wrapper
#[derive(Debug, Clone)]
pub struct ValueMember {
    /// Member name
    pub name: String,
    /// Member type
    pub ty: TypeRef,
    /// Field or property
    pub kind: ValueMemberKind,
}

impl ValueMember {
    /// Whether the member can be written
    pub fn is_writable(&self) -> bool {
        match self.kind {
            ValueMemberKind::Field { .. } => true,
            ValueMemberKind::Property { writable, .. } => writable,
        }
    }

    /// Read the member from the wrapper instance in `holder`
    pub fn read(&self, holder: &Value) -> FaultResult<Value> {
        let obj = self.holder(holder)?;
        match self.kind {
            ValueMemberKind::Field { slot } => obj.field(slot),
            ValueMemberKind::Property { .. } => obj.get(&self.name),
        }
    }

    /// Write the member of the wrapper instance in `holder`
    pub fn write(&self, holder: &Value, value: Value) -> FaultResult<()> {
        let obj = self.holder(holder)?;
        match self.kind {
            ValueMemberKind::Field { slot } => obj.set_field(slot, value),
            ValueMemberKind::Property { .. } => obj.set(&self.name, value),
        }
    }

    fn holder<'a>(&self, holder: &'a Value) -> FaultResult<&'a ObjectRef> {
        holder
            .as_object()
            .ok_or_else(|| Fault::NullReference(format!("cannot access '{}' of null", self.name)))
    }
}

/// Find the member of `wrapper` that holds a value of type `desired`
pub fn resolve(wrapper: &TypeRef, desired: &TypeRef) -> Option<ValueMember> {
    if !wrapper.is_class() {
        return None;
    }

    let fields: Vec<ValueMember> = wrapper
        .public_fields()
        .into_iter()
        .map(|(slot, f)| ValueMember {
            name: f.name.clone(),
            ty: f.ty.clone(),
            kind: ValueMemberKind::Field { slot },
        })
        .collect();

    let properties: Vec<ValueMember> = wrapper
        .public_properties()
        .into_iter()
        .map(|(_, p)| ValueMember {
            name: p.name.clone(),
            ty: p.ty.clone(),
            kind: ValueMemberKind::Property {
                readable: p.has_getter(),
                writable: p.has_setter(),
            },
        })
        .collect();

    let found = pick(&fields, desired).or_else(|| pick(&properties, desired));
    tracing::trace!(
        wrapper = %wrapper,
        desired = %desired,
        member = ?found.as_ref().map(|m| m.name.as_str()),
        "resolved value member"
    );
    found
}

fn pick(candidates: &[ValueMember], desired: &TypeRef) -> Option<ValueMember> {
    candidates
        .iter()
        .find(|m| m.name == VALUE_MEMBER && is_member_of_type(desired, &m.ty))
        .or_else(|| candidates.iter().find(|m| is_member_of_type(desired, &m.ty)))
        .or_else(|| {
            candidates
                .iter()
                .find(|m| m.name == VALUE_MEMBER && is_based_on(desired, &m.ty))
        })
        .cloned()
}

/// Proper base of `desired` below the root type
fn is_based_on(desired: &TypeRef, member: &TypeRef) -> bool {
    !matches!(member.kind(), TypeKind::Any) && desired.is_subclass_of(member)
}

/// Same type, or an enum and its underlying scalar in either direction
fn is_member_of_type(desired: &TypeRef, member: &TypeRef) -> bool {
    if member == desired {
        return true;
    }
    match (desired.enum_underlying(), member.enum_underlying()) {
        (Some(underlying), _) => member.scalar_kind() == Some(underlying),
        (None, Some(underlying)) => desired.scalar_kind() == Some(underlying),
        (None, None) => false,
    }
}
