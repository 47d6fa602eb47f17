//! MapEmit - runtime synthesis for mapped classes
//!
//! Given an abstract mapped class, the engine builds a concrete class that
//! implements every abstract property with a backing field, constructs the
//! fields it owns and wraps creation in failure-tolerant descriptors. It also
//! builds standalone member mappers used to copy values between records and
//! objects.
//!
//! # Example
//!
//! ```ignore
//! use mapemit_engine::MapRegistry;
//! use mapemit_sdk::{AttributeMetadataProvider, ClassBuilder, PropertyDef, ScalarKind, TypeRef};
//!
//! let person = ClassBuilder::new("Shop.Person")
//!     .abstract_class()
//!     .property(PropertyDef::new("Name", &TypeRef::scalar(ScalarKind::Str)).abstract_accessors())
//!     .default_constructor()
//!     .build()?;
//!
//! let registry = MapRegistry::new(AttributeMetadataProvider);
//! let descriptor = registry.descriptor(&person)?;
//! let obj = descriptor.create_instance().unwrap();
//! obj.set("Name", "Ada".into())?;
//! ```

#![warn(rust_2018_idioms)]

pub mod config;
pub mod emit;
pub mod error;
pub mod hooks;
pub mod registry;

pub use config::EmitOptions;
pub use emit::{
    Creation, Descriptor, MemberKind, MemberMapper, MemberMapperRequest, SynthesisReport,
    DEFAULT_CTOR, FACTORY_CTOR,
};
pub use error::EmitError;
pub use hooks::{ExceptionHandler, IdentityMapper, LogExceptionHandler, ValueMapper};
pub use registry::{MapRegistry, MapRegistryBuilder};
