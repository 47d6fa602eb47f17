//! Injected collaborators: exception handler and value mapping hooks

use mapemit_sdk::{Fault, TypeRef, Value};

/// Receives every instance-creation failure exactly once
pub trait ExceptionHandler: Send + Sync {
    /// Called with the type whose creation failed
    fn handle(&self, ty: &TypeRef, fault: &Fault);
}

impl<F> ExceptionHandler for F
where
    F: Fn(&TypeRef, &Fault) + Send + Sync,
{
    fn handle(&self, ty: &TypeRef, fault: &Fault) {
        self(ty, fault)
    }
}

/// Default handler: logs the failure
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExceptionHandler;

impl ExceptionHandler for LogExceptionHandler {
    fn handle(&self, ty: &TypeRef, fault: &Fault) {
        tracing::warn!(ty = %ty, error = %fault, "instance creation failed");
    }
}

/// Conversion hooks between member values and the external record representation
pub trait ValueMapper: Send + Sync {
    /// Member value to external value
    fn map_to(&self, value: Value) -> Value {
        value
    }

    /// External value to member value
    fn map_from(&self, value: Value) -> Value {
        value
    }
}

/// Hooks that pass values through unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityMapper;

impl ValueMapper for IdentityMapper {}
