//! Named, reusable bundles of checks.

use crate::error::{Result, ValidationError};
use constraints_core::{Check, Configurer};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// An ordered bundle of checks referenced by id.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    id: String,
    checks: Vec<Arc<Check>>,
}

impl ConstraintSet {
    pub fn new(id: impl Into<String>, checks: impl IntoIterator<Item = Check>) -> Self {
        Self {
            id: id.into(),
            checks: checks.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn checks(&self) -> &[Arc<Check>] {
        &self.checks
    }
}

/// Registry of constraint sets, with lookup falling back to configurers.
#[derive(Debug, Default)]
pub struct ConstraintSets {
    sets: RwLock<HashMap<String, Arc<ConstraintSet>>>,
}

impl ConstraintSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `set`; an existing set with the same id is only replaced
    /// when `overwrite` is true.
    pub fn add(&self, set: ConstraintSet, overwrite: bool) -> Result<()> {
        let mut sets = self.sets.write().unwrap_or_else(PoisonError::into_inner);
        if !overwrite && sets.contains_key(set.id()) {
            return Err(ValidationError::ConstraintSetAlreadyDefined(set.id.clone()));
        }
        debug!("Registering constraint set '{}'", set.id());
        sets.insert(set.id.clone(), Arc::new(set));
        Ok(())
    }

    pub fn remove(&self, id: &str) -> Option<Arc<ConstraintSet>> {
        self.sets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<ConstraintSet>> {
        self.sets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Looks up `id`, asking the configurers when it is not registered yet.
    ///
    /// A set found through configurers is registered for later lookups.
    pub fn resolve(
        &self,
        id: &str,
        configurers: &[Arc<dyn Configurer>],
    ) -> Result<Arc<ConstraintSet>> {
        if let Some(set) = self.get(id) {
            return Ok(set);
        }

        let mut checks: Option<Vec<Check>> = None;
        for configurer in configurers {
            let config = configurer
                .constraint_set_configuration(id)
                .map_err(ValidationError::Configurer)?;
            let Some(config) = config else {
                continue;
            };
            let overwrite = config.overwrite.unwrap_or(false);
            checks = match checks.take() {
                Some(mut existing) if !overwrite => {
                    existing.extend(config.checks);
                    Some(existing)
                }
                _ => Some(config.checks),
            };
        }
        let checks =
            checks.ok_or_else(|| ValidationError::UndefinedConstraintSet(id.to_string()))?;

        debug!("Resolved constraint set '{}' from configurers", id);
        let set = Arc::new(ConstraintSet::new(id, checks));
        let mut sets = self.sets.write().unwrap_or_else(PoisonError::into_inner);
        // another thread may have won the race, keep its set
        Ok(sets.entry(id.to_string()).or_insert(set).clone())
    }
}
