//! Initializing data carrier
//!
//! Factory-style constructors receive an [`InitDataRef`]. The only slot the
//! synthesis engine relies on is `member_parameters`: the construction
//! parameters of the member currently being created.

use crate::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Parameter carrier passed through factory-style construction
#[derive(Default)]
pub struct InitData {
    member_parameters: Mutex<Option<Arc<[Value]>>>,
}

impl InitData {
    /// Parameters of the member under construction
    pub fn member_parameters(&self) -> Option<Arc<[Value]>> {
        self.member_parameters.lock().clone()
    }

    /// Replace the member parameters, returning the previous ones
    pub fn set_member_parameters(&self, params: Option<Arc<[Value]>>) -> Option<Arc<[Value]>> {
        std::mem::replace(&mut *self.member_parameters.lock(), params)
    }
}

/// Shared handle to an [`InitData`]
#[derive(Clone, Default)]
pub struct InitDataRef(Arc<InitData>);

impl InitDataRef {
    /// Fresh carrier with no parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both handles point to the same carrier
    pub fn ptr_eq(&self, other: &InitDataRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for InitDataRef {
    type Target = InitData;

    fn deref(&self) -> &InitData {
        &self.0
    }
}

impl fmt::Debug for InitDataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitDataRef")
            .field("member_parameters", &self.member_parameters())
            .finish()
    }
}
