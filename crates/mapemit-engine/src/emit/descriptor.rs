//! Descriptor factory
//!
//! A [`Descriptor`] creates instances of a mapped type: through the
//! synthesized concrete type when the mapped type is abstract, directly
//! otherwise. Creation never propagates a failure. Faults and panics raised by
//! constructors are reported to the exception handler once and the caller gets
//! [`Creation::Failed`].

use crate::emit::dump::SynthesisReport;
use crate::emit::plan::Params;
use crate::emit::synth::{Synthesis, DEFAULT_CTOR, FACTORY_CTOR};
use crate::hooks::ExceptionHandler;
use mapemit_sdk::{Fault, InitDataRef, ObjectRef, TypeRef, Value};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Outcome of one creation
#[derive(Debug, Clone)]
pub enum Creation {
    /// Instance constructed
    Created(ObjectRef),
    /// Constructor failed; the handler has been notified
    Failed(Fault),
    /// The mapped type has no applicable public constructor
    Unavailable,
}

impl Creation {
    /// The created instance, if any
    pub fn into_option(self) -> Option<ObjectRef> {
        match self {
            Creation::Created(obj) => Some(obj),
            _ => None,
        }
    }

    /// Check if an instance was created
    pub fn is_created(&self) -> bool {
        matches!(self, Creation::Created(_))
    }
}

/// Creation operations of one mapped type
pub struct Descriptor {
    original: TypeRef,
    mapped: TypeRef,
    default_ctor: Option<usize>,
    factory_ctor: Option<usize>,
    factory_takes_init: bool,
    parameters: FxHashMap<String, Params>,
    report: Option<SynthesisReport>,
    handler: Arc<dyn ExceptionHandler>,
}

impl Descriptor {
    /// Descriptor of a type that needed no synthesis
    pub(crate) fn concrete(
        ty: &TypeRef,
        handler: Arc<dyn ExceptionHandler>,
        warn_unavailable: bool,
    ) -> Self {
        let default_ctor = ty
            .default_constructor()
            .filter(|(_, c)| c.is_public)
            .map(|(index, _)| index);
        // Falls back to the default constructor, dropping the init argument.
        let (factory_ctor, factory_takes_init) = match ty
            .find_constructor(&[TypeRef::init_data()])
            .filter(|(_, c)| c.is_public)
        {
            Some((index, _)) => (Some(index), true),
            None => (default_ctor, false),
        };

        if warn_unavailable {
            if default_ctor.is_none() {
                tracing::warn!(
                    operation = "create",
                    "The '{}' type must have the public default constructor.",
                    ty.short_name()
                );
            }
            if factory_ctor.is_none() {
                tracing::warn!(
                    operation = "create_with",
                    "The '{}' type must have the public default constructor.",
                    ty.short_name()
                );
            }
        }

        Self {
            original: ty.clone(),
            mapped: ty.clone(),
            default_ctor,
            factory_ctor,
            factory_takes_init,
            parameters: FxHashMap::default(),
            report: None,
            handler,
        }
    }

    /// Descriptor of a synthesized type
    pub(crate) fn synthesized(
        original: &TypeRef,
        synthesis: Synthesis,
        handler: Arc<dyn ExceptionHandler>,
    ) -> Self {
        Self {
            original: original.clone(),
            mapped: synthesis.ty,
            default_ctor: Some(DEFAULT_CTOR),
            factory_ctor: Some(FACTORY_CTOR),
            factory_takes_init: true,
            parameters: synthesis.parameters.into_iter().collect(),
            report: Some(synthesis.report),
            handler,
        }
    }

    /// The mapped type this descriptor was requested for
    pub fn original_type(&self) -> &TypeRef {
        &self.original
    }

    /// The type actually instantiated
    pub fn mapped_type(&self) -> &TypeRef {
        &self.mapped
    }

    /// Check if the mapped type was synthesized
    pub fn is_synthesized(&self) -> bool {
        self.report.is_some()
    }

    /// What synthesis produced, for synthesized types
    pub fn report(&self) -> Option<&SynthesisReport> {
        self.report.as_ref()
    }

    /// Whether zero-argument creation is available
    pub fn can_create(&self) -> bool {
        self.default_ctor.is_some()
    }

    /// Whether creation from initializing data is available
    pub fn can_create_with(&self) -> bool {
        self.factory_ctor.is_some()
    }

    /// Construction parameters recorded for `property`
    pub fn property_parameters(&self, property: &str) -> Option<&[Value]> {
        self.parameters.get(property).map(|p| &p[..])
    }

    /// Create through the zero-argument constructor
    pub fn create(&self) -> Creation {
        match self.default_ctor {
            Some(ctor) => self.guarded(ctor, &[]),
            None => Creation::Unavailable,
        }
    }

    /// Create through the initializing-data constructor, or the default
    /// constructor when the type has none
    pub fn create_with(&self, init: &InitDataRef) -> Creation {
        match self.factory_ctor {
            Some(ctor) if self.factory_takes_init => {
                self.guarded(ctor, &[Value::InitData(init.clone())])
            }
            Some(ctor) => self.guarded(ctor, &[]),
            None => Creation::Unavailable,
        }
    }

    /// [`create`](Self::create), keeping only the instance
    pub fn create_instance(&self) -> Option<ObjectRef> {
        self.create().into_option()
    }

    /// [`create_with`](Self::create_with), keeping only the instance
    pub fn create_instance_with(&self, init: &InitDataRef) -> Option<ObjectRef> {
        self.create_with(init).into_option()
    }

    fn guarded(&self, ctor: usize, args: &[Value]) -> Creation {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.mapped.construct(ctor, args)));
        let fault = match outcome {
            Ok(Ok(obj)) => return Creation::Created(obj),
            Ok(Err(fault)) => fault,
            Err(payload) => Fault::Panic(panic_message(payload.as_ref())),
        };
        self.handler.handle(&self.original, &fault);
        Creation::Failed(fault)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("original", &self.original)
            .field("mapped", &self.mapped)
            .field("default_ctor", &self.default_ctor)
            .field("factory_ctor", &self.factory_ctor)
            .field("factory_takes_init", &self.factory_takes_init)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
