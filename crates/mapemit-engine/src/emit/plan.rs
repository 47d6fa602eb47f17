//! Construction plans
//!
//! The constructors of a synthesized type are not hand-written closures; they
//! are lists of plan steps decided once at synthesis time and interpreted on
//! every construction. Plans render as one line per step, which is what the
//! debug dump shows.

use crate::emit::descriptor::Descriptor;
use crate::registry::RegistryInner;
use mapemit_sdk::{cast_to, Fault, FaultResult, InitDataRef, ObjectRef, PropertyInfo, TypeRef, Value};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::{Arc, Weak};

/// Per-property construction parameters
pub type Params = Arc<[Value]>;

/// Which initializing-data instance carries member parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    /// The factory constructor's argument
    Argument,
    /// A carrier private to one constructor invocation
    Transient,
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Carrier::Argument => f.write_str("init"),
            Carrier::Transient => f.write_str("transient init"),
        }
    }
}

/// Constructor argument
#[derive(Debug, Clone)]
pub enum Operand {
    /// Value baked into the plan
    Literal(Value),
    /// Read from the property's parameter array and cast
    Param {
        /// Position in the array
        index: usize,
        /// Constructor parameter type
        ty: TypeRef,
    },
}

impl Operand {
    fn load(&self, params: Option<&Params>) -> FaultResult<Value> {
        match self {
            Operand::Literal(v) => Ok(v.clone()),
            Operand::Param { index, ty } => {
                let v = params
                    .and_then(|p| p.get(*index))
                    .cloned()
                    .ok_or_else(|| Fault::MissingMember {
                        ty: "parameters".to_string(),
                        member: format!("[{}]", index),
                    })?;
                cast_to(v, ty)
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{:?}", v),
            Operand::Param { index, ty } => write!(f, "params[{}] as {}", index, ty),
        }
    }
}

/// Lazily resolved descriptor of a field type
///
/// The descriptor is synthesized while planning the owning type; this handle
/// fetches it from the registry cache on first construction, the way a static
/// field holding the descriptor would be filled on first use.
pub struct DescriptorLookup {
    field_type: TypeRef,
    registry: Weak<RegistryInner>,
    cell: OnceCell<Arc<Descriptor>>,
}

impl DescriptorLookup {
    pub(crate) fn new(field_type: &TypeRef, registry: Weak<RegistryInner>) -> Self {
        Self {
            field_type: field_type.clone(),
            registry,
            cell: OnceCell::new(),
        }
    }

    /// Field type whose descriptor is looked up
    pub fn field_type(&self) -> &TypeRef {
        &self.field_type
    }

    /// Whether the descriptor has been resolved
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    fn get(&self) -> FaultResult<Arc<Descriptor>> {
        self.cell
            .get_or_try_init(|| {
                let registry = self
                    .registry
                    .upgrade()
                    .ok_or_else(|| Fault::Thrown("mapping registry has been dropped".to_string()))?;
                registry
                    .descriptor(&self.field_type)
                    .map_err(|e| Fault::Thrown(e.to_string()))
            })
            .cloned()
    }
}

/// How a field value is produced
pub enum FieldSource {
    /// Delegate to the field type's descriptor
    Descriptor {
        /// Shared lazy lookup
        lookup: Arc<DescriptorLookup>,
        /// Carrier of the member parameters
        carrier: Carrier,
    },
    /// Call a constructor with explicit arguments
    New {
        /// Type to construct
        target: TypeRef,
        /// Constructor index
        ctor: usize,
        /// Arguments in order
        args: Vec<Operand>,
    },
    /// Call the factory constructor of the field type
    NewWithInitData {
        /// Type to construct
        target: TypeRef,
        /// Constructor index
        ctor: usize,
        /// Carrier passed to the constructor
        carrier: Carrier,
    },
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSource::Descriptor { lookup, carrier } => write!(
                f,
                "descriptor({}).create_instance({})",
                lookup.field_type, carrier
            ),
            FieldSource::New { target, args, .. } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "new {}({})", target, args.join(", "))
            }
            FieldSource::NewWithInitData {
                target, carrier, ..
            } => write!(f, "new {}({})", target, carrier),
        }
    }
}

/// Store a newly constructed value into a backing field
pub struct ConstructField {
    /// Property the field backs
    pub property: String,
    /// Field slot
    pub slot: usize,
    /// Declared field type
    pub field_type: TypeRef,
    /// Construction parameters of the property
    pub params: Option<Params>,
    /// Value source
    pub source: FieldSource,
}

impl ConstructField {
    fn run(&self, obj: &ObjectRef, frame: &mut CtorFrame) -> FaultResult<()> {
        let value = match &self.source {
            FieldSource::Descriptor { lookup, carrier } => {
                let descriptor = lookup.get()?;
                let init = frame.carrier(*carrier);
                let created = {
                    let _params = MemberParameters::install(&init, self.params.as_ref());
                    descriptor.create_instance_with(&init)
                };
                created
                    .filter(|o| o.is_instance_of(&self.field_type))
                    .map(Value::Object)
                    .unwrap_or(Value::Null)
            }
            FieldSource::New { target, ctor, args } => {
                let args = args
                    .iter()
                    .map(|a| a.load(self.params.as_ref()))
                    .collect::<FaultResult<Vec<_>>>()?;
                Value::Object(target.construct(*ctor, &args)?)
            }
            FieldSource::NewWithInitData {
                target,
                ctor,
                carrier,
            } => {
                let init = frame.carrier(*carrier);
                let _params = MemberParameters::install(&init, self.params.as_ref());
                Value::Object(target.construct(*ctor, &[Value::InitData(init.clone())])?)
            }
        };
        obj.set_field(self.slot, value)
    }
}

impl fmt::Display for ConstructField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{} = {}", self.property, self.source)?;
        if let Some(params) = &self.params {
            write!(f, " with {:?}", &params[..])?;
        }
        Ok(())
    }
}

/// Push property info into a constructed field value
pub struct SetPropertyInfo {
    /// Field name
    pub field: String,
    /// Field slot
    pub slot: usize,
    /// Info recorded by the type initializer
    pub info: PropertyInfo,
}

impl SetPropertyInfo {
    fn run(&self, obj: &ObjectRef) -> FaultResult<()> {
        let value = obj.field(self.slot)?;
        let target = value
            .as_object()
            .ok_or_else(|| Fault::NullReference(format!("'{}' is null", self.field)))?;
        let sink = target
            .class()
            .property_info_sink()
            .cloned()
            .ok_or_else(|| Fault::MissingMember {
                ty: target.type_name().to_string(),
                member: "SetInfo".to_string(),
            })?;
        sink(target, &self.info, obj)
    }
}

impl fmt::Display for SetPropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.SetInfo({} {}, this)",
            self.field, self.info.property_type, self.info.name
        )
    }
}

/// Private per-instance initialization routine
#[derive(Default)]
pub struct InitRoutine {
    /// Steps in property order
    pub steps: Vec<SetPropertyInfo>,
}

impl InitRoutine {
    fn run(&self, obj: &ObjectRef) -> FaultResult<()> {
        self.steps.iter().try_for_each(|s| s.run(obj))
    }
}

/// Constructor flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtorKind {
    /// Zero-argument
    Default,
    /// Takes initializing data
    Factory,
}

/// Call of a base class constructor
#[derive(Debug, Clone)]
pub struct BaseCall {
    /// Base class
    pub target: TypeRef,
    /// Constructor index on the base
    pub ctor: usize,
    /// Forward the initializing data
    pub passes_init: bool,
}

/// Body of one synthesized constructor
pub struct CtorPlan {
    /// Flavour
    pub kind: CtorKind,
    /// Field construction in property order
    pub steps: Vec<ConstructField>,
    /// Base constructor to chain to, if the base has one
    pub base: Option<BaseCall>,
}

impl CtorPlan {
    /// Run against a freshly allocated instance
    pub(crate) fn run(&self, init: &InitRoutine, obj: &ObjectRef, args: &[Value]) -> FaultResult<()> {
        let argument = match self.kind {
            CtorKind::Default => None,
            CtorKind::Factory => args.first().and_then(Value::as_init_data).cloned(),
        };
        let mut frame = CtorFrame {
            argument,
            transient: None,
        };

        for step in &self.steps {
            step.run(obj, &mut frame)?;
        }
        init.run(obj)?;

        if let Some(base) = &self.base {
            if base.passes_init {
                let init = frame.carrier(Carrier::Argument);
                base.target
                    .invoke_constructor(base.ctor, obj, &[Value::InitData(init)])?;
            } else {
                base.target.invoke_constructor(base.ctor, obj, &[])?;
            }
        }
        Ok(())
    }

    /// One line per step, as shown in the dump
    pub fn describe(&self, init: &InitRoutine) -> Vec<String> {
        let mut lines: Vec<String> = self.steps.iter().map(ToString::to_string).collect();
        if !init.steps.is_empty() {
            lines.push("InitPropertiesOf(this)".to_string());
        }
        if let Some(base) = &self.base {
            let arg = if base.passes_init { "init" } else { "" };
            lines.push(format!("base {}::.ctor#{}({})", base.target, base.ctor, arg));
        }
        lines
    }
}

struct CtorFrame {
    argument: Option<InitDataRef>,
    transient: Option<InitDataRef>,
}

impl CtorFrame {
    fn carrier(&mut self, carrier: Carrier) -> InitDataRef {
        let slot = match carrier {
            Carrier::Argument => &mut self.argument,
            Carrier::Transient => &mut self.transient,
        };
        slot.get_or_insert_with(InitDataRef::new).clone()
    }
}

/// Member parameters installed on a carrier for the duration of one creation
struct MemberParameters<'a> {
    init: Option<&'a InitDataRef>,
}

impl<'a> MemberParameters<'a> {
    fn install(init: &'a InitDataRef, params: Option<&Params>) -> Self {
        match params {
            Some(params) => {
                init.set_member_parameters(Some(params.clone()));
                Self { init: Some(init) }
            }
            None => Self { init: None },
        }
    }
}

impl Drop for MemberParameters<'_> {
    fn drop(&mut self) {
        if let Some(init) = self.init {
            init.set_member_parameters(None);
        }
    }
}
