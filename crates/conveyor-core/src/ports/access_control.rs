//! Authorization port, supplied by the host application.

use crate::domain::ComponentKey;

/// The principal behind a facade call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub name: String,
}

impl Caller {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Permission checks the facade delegates to.
///
/// The queue itself knows nothing about users; the host wires an
/// implementation in at construction time.
pub trait AccessControl: Send + Sync {
    /// May this caller perform administrative operations (cancel)?
    fn is_admin(&self, caller: &Caller) -> bool;

    /// May this caller see tasks of this component?
    fn can_access(&self, caller: &Caller, component: &ComponentKey) -> bool;
}
