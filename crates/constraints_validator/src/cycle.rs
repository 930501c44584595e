//! Cycle guard for cascaded validation.

use constraints_core::ObjectRef;
use std::collections::HashMap;
use std::sync::Arc;

/// Identities of the objects entered during one top-level validation call.
///
/// Owned by the call and dropped with it, so nothing leaks between calls or
/// threads even when the call fails. Entered objects are held until then:
/// an object produced on the fly by a getter would otherwise be freed and
/// its address handed to the next one.
#[derive(Debug, Default)]
pub struct CycleGuard {
    entered: HashMap<usize, ObjectRef>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `object` as entered; returns false if it already was.
    pub fn enter(&mut self, object: &ObjectRef) -> bool {
        let identity = identity(object);
        if self.entered.contains_key(&identity) {
            return false;
        }
        self.entered.insert(identity, Arc::clone(object));
        true
    }

    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.entered.contains_key(&identity(object))
    }

    pub fn len(&self) -> usize {
        self.entered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entered.is_empty()
    }
}

// unique while the guard holds the object
fn identity(object: &ObjectRef) -> usize {
    Arc::as_ptr(object) as usize
}
