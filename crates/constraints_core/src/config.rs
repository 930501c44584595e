//! Constraint configuration data and the [`Configurer`] collaborator.
//!
//! A configurer answers two questions: "which checks does this class carry"
//! and "which checks make up this constraint set". How it knows (builder
//! code, configuration files, anything else) is its own business. The
//! engine compiles the returned [`ClassConfig`] into its per-class registry.

use crate::check::Check;
use crate::object::ClassInfo;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Checks of a field.
#[derive(Debug, Clone)]
pub struct FieldConfig {
    pub name: String,
    pub checks: Vec<Check>,
    /// Replace previously configured checks instead of appending
    pub overwrite: Option<bool>,
}

/// Checks of one method or constructor parameter.
#[derive(Debug, Clone, Default)]
pub struct ParameterConfig {
    pub checks: Vec<Check>,
    pub overwrite: Option<bool>,
}

/// Checks of a method return value.
#[derive(Debug, Clone, Default)]
pub struct ReturnValueConfig {
    pub checks: Vec<Check>,
    pub overwrite: Option<bool>,
}

/// Checks of a method, identified by name and arity.
#[derive(Debug, Clone)]
pub struct MethodConfig {
    pub name: String,
    pub arity: usize,
    /// Evaluate the return value on every object validation
    pub is_invariant: bool,
    /// Parameter configurations by position
    pub parameters: Vec<ParameterConfig>,
    pub return_value: Option<ReturnValueConfig>,
    pub overwrite: Option<bool>,
}

impl MethodConfig {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            is_invariant: false,
            parameters: Vec::new(),
            return_value: None,
            overwrite: None,
        }
    }
}

/// Checks of a constructor's parameters.
#[derive(Debug, Clone)]
pub struct ConstructorConfig {
    /// Position of the constructor in the class declaration
    pub index: usize,
    pub parameters: Vec<ParameterConfig>,
    pub overwrite: Option<bool>,
}

/// Object-level checks.
#[derive(Debug, Clone, Default)]
pub struct ObjectConfig {
    pub checks: Vec<Check>,
    pub overwrite: Option<bool>,
}

/// Complete configuration of one class.
///
/// Flags left at `None` keep whatever an earlier configurer (or the
/// default) decided.
#[derive(Debug, Clone, Default)]
pub struct ClassConfig {
    pub class: String,
    pub apply_field_constraints_to_setters: Option<bool>,
    pub apply_field_constraints_to_constructors: Option<bool>,
    pub check_invariants: Option<bool>,
    pub assert_parameters_not_null: Option<bool>,
    pub inspect_interfaces: Option<bool>,
    /// Default `overwrite` of every section
    pub overwrite: Option<bool>,
    pub fields: Vec<FieldConfig>,
    pub methods: Vec<MethodConfig>,
    pub constructors: Vec<ConstructorConfig>,
    pub object: Option<ObjectConfig>,
}

impl ClassConfig {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Default::default()
        }
    }

    /// Resolves the `overwrite` flag of a section.
    pub fn overwrite_for(&self, section: Option<bool>) -> bool {
        section.or(self.overwrite).unwrap_or(false)
    }
}

/// Configuration of a named constraint set.
#[derive(Debug, Clone)]
pub struct ConstraintSetConfig {
    pub id: String,
    pub checks: Vec<Check>,
    pub overwrite: Option<bool>,
}

/// Source of constraint configuration.
pub trait Configurer: Send + Sync {
    /// Returns the configuration of `class`, if this configurer has one.
    fn class_configuration(&self, class: &ClassInfo) -> anyhow::Result<Option<ClassConfig>>;

    /// Returns the constraint set `id`, if this configurer defines it.
    fn constraint_set_configuration(&self, id: &str)
    -> anyhow::Result<Option<ConstraintSetConfig>>;
}

/// In-memory configurer fed by builder code.
///
/// # Example
///
/// ```rust
/// use constraints_core::{Check, ClassConfigBuilder, ProgrammaticConfigurer};
///
/// let configurer = ProgrammaticConfigurer::new();
/// configurer.add_class_config(
///     ClassConfigBuilder::new("Person")
///         .field("name", [Check::not_null()])
///         .build(),
/// );
/// assert!(configurer.has_class_config("Person"));
/// ```
#[derive(Debug, Default)]
pub struct ProgrammaticConfigurer {
    classes: RwLock<HashMap<String, ClassConfig>>,
    constraint_sets: RwLock<HashMap<String, ConstraintSetConfig>>,
}

impl ProgrammaticConfigurer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a class configuration, replacing any previous one for the class.
    pub fn add_class_config(&self, config: ClassConfig) {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        classes.insert(config.class.clone(), config);
    }

    pub fn remove_class_config(&self, class: &str) -> Option<ClassConfig> {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        classes.remove(class)
    }

    pub fn has_class_config(&self, class: &str) -> bool {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        classes.contains_key(class)
    }

    /// Stores a constraint set, replacing any previous one with the same id.
    pub fn add_constraint_set(&self, config: ConstraintSetConfig) {
        let mut sets = self
            .constraint_sets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sets.insert(config.id.clone(), config);
    }
}

impl Configurer for ProgrammaticConfigurer {
    fn class_configuration(&self, class: &ClassInfo) -> anyhow::Result<Option<ClassConfig>> {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        Ok(classes.get(class.name()).cloned())
    }

    fn constraint_set_configuration(
        &self,
        id: &str,
    ) -> anyhow::Result<Option<ConstraintSetConfig>> {
        let sets = self
            .constraint_sets
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(sets.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ClassBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overwrite_resolution() {
        let mut config = ClassConfig::new("Person");
        assert!(!config.overwrite_for(None));
        config.overwrite = Some(true);
        assert!(config.overwrite_for(None));
        assert!(!config.overwrite_for(Some(false)));
    }

    #[test]
    fn test_programmatic_configurer_lookup() {
        let configurer = ProgrammaticConfigurer::new();
        let mut config = ClassConfig::new("Person");
        config.check_invariants = Some(true);
        configurer.add_class_config(config);
        configurer.add_constraint_set(ConstraintSetConfig {
            id: "name".to_string(),
            checks: vec![Check::not_null()],
            overwrite: None,
        });

        let person = ClassBuilder::new("Person").build();
        let other = ClassBuilder::new("Other").build();
        let found = configurer.class_configuration(&person).unwrap().unwrap();
        assert_eq!(found.check_invariants, Some(true));
        assert!(configurer.class_configuration(&other).unwrap().is_none());

        let set = configurer.constraint_set_configuration("name").unwrap().unwrap();
        assert_eq!(set.checks.len(), 1);
        assert!(configurer.constraint_set_configuration("missing").unwrap().is_none());

        assert!(configurer.remove_class_config("Person").is_some());
        assert!(!configurer.has_class_config("Person"));
    }
}
