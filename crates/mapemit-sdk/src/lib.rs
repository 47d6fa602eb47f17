//! MapEmit SDK - object model consumed by the synthesis engine
//!
//! This crate holds everything a metadata provider needs to describe mapped
//! classes without depending on the engine: dynamic [`Value`]s, type
//! descriptors ([`TypeRef`]), instances ([`ObjectRef`]), the initializing-data
//! carrier and the [`MetadataProvider`] trait.
//!
//! # Example
//!
//! ```ignore
//! use mapemit_sdk::{ClassBuilder, PropertyDef, ScalarKind, TypeRef};
//!
//! let str_ty = TypeRef::scalar(ScalarKind::Str);
//! let person = ClassBuilder::new("Shop.Person")
//!     .abstract_class()
//!     .property(PropertyDef::new("Name", &str_ty).abstract_accessors())
//!     .default_constructor()
//!     .build()?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builder;
pub mod convert;
pub mod error;
pub mod init_data;
pub mod object;
pub mod property_info;
pub mod provider;
pub mod types;
pub mod value;
pub mod wrappers;

pub use builder::ClassBuilder;
pub use convert::{cast_to, convert_to};
pub use error::{Fault, FaultResult, ModelError};
pub use init_data::{InitData, InitDataRef};
pub use object::ObjectRef;
pub use property_info::{PropertyInfo, SetInfoFn};
pub use provider::{AttributeMetadataProvider, MetadataProvider};
pub use types::{
    signature, Accessor, ClassDef, CtorDef, CtorFn, EnumDef, FieldDef, GetterFn,
    PropertyAttribute, PropertyDef, ScalarKind, SetterFn, StaticDef, TypeKey, TypeKind, TypeRef,
    IMAP_GENERATED, IMAP_SET_PROPERTY_INFO, INULLABLE,
};
pub use value::Value;
pub use wrappers::{is_nullable_type, nullable_scalar, IS_NULL_MEMBER, NULL_STATIC, VALUE_MEMBER};
