//! Synthesis of concrete types, descriptors and member mappers
//!
//! The pipeline for one abstract mapped type:
//!
//! 1. [`resolver`] finds the value member of wrapper field types
//! 2. `planner` decides how each backing field is constructed
//! 3. `accessor` builds getter and setter bodies
//! 4. `synth` assembles the concrete class
//! 5. [`descriptor`] wraps its constructors in guarded creation operations
//!
//! [`member_mapper`] is independent of the above and works on any record type.

mod accessor;
mod context;
pub mod descriptor;
pub mod dump;
pub mod member_mapper;
pub mod plan;
mod planner;
pub mod resolver;
mod synth;

pub use accessor::{AccessorPlan, SetterShape};
pub use descriptor::{Creation, Descriptor};
pub use dump::{write_dump, SynthesisReport};
pub use member_mapper::{MemberKind, MemberMapper, MemberMapperRequest};
pub use resolver::{resolve, ValueMember, ValueMemberKind};
pub use synth::{DEFAULT_CTOR, FACTORY_CTOR};

pub(crate) use synth::synthesize;
