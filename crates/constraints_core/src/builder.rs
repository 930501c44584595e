//! Builder pattern for creating constraint configurations.
//!
//! This module provides ergonomic builders for class configurations and
//! constraint sets with a fluent API.

use crate::check::Check;
use crate::config::{
    ClassConfig, ConstraintSetConfig, ConstructorConfig, FieldConfig, MethodConfig,
    ObjectConfig, ParameterConfig, ReturnValueConfig,
};

/// Builder for creating a [`ClassConfig`].
///
/// # Example
///
/// ```rust
/// use constraints_core::{Check, ClassConfigBuilder};
///
/// let config = ClassConfigBuilder::new("Person")
///     .field("name", [Check::not_null(), Check::max_length(20)])
///     .invariant("getAge", [Check::min(0.0)])
///     .constructor_parameter(0, 0, [Check::assert_field_constraints()])
///     .check_invariants(true)
///     .build();
/// assert_eq!(config.fields.len(), 1);
/// assert_eq!(config.methods.len(), 1);
/// ```
#[derive(Debug)]
pub struct ClassConfigBuilder {
    config: ClassConfig,
}

impl ClassConfigBuilder {
    /// Creates a builder for the named class.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            config: ClassConfig::new(class),
        }
    }

    /// Adds checks to a field.
    pub fn field(mut self, name: impl Into<String>, checks: impl IntoIterator<Item = Check>) -> Self {
        let name = name.into();
        let checks = checks.into_iter();
        match self.config.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.checks.extend(checks),
            None => self.config.fields.push(FieldConfig {
                name,
                checks: checks.collect(),
                overwrite: None,
            }),
        }
        self
    }

    /// Adds checks to the return value of a getter evaluated on every object validation.
    pub fn invariant(self, getter: impl Into<String>, checks: impl IntoIterator<Item = Check>) -> Self {
        self.return_value(getter, 0, true, checks)
    }

    /// Adds checks to the return value of a method.
    pub fn method_return_value(
        self,
        method: impl Into<String>,
        arity: usize,
        checks: impl IntoIterator<Item = Check>,
    ) -> Self {
        self.return_value(method, arity, false, checks)
    }

    /// Adds checks to a method parameter.
    pub fn method_parameter(
        mut self,
        method: impl Into<String>,
        arity: usize,
        index: usize,
        checks: impl IntoIterator<Item = Check>,
    ) -> Self {
        let method = self.method_entry(method.into(), arity);
        parameter_entry(&mut method.parameters, index)
            .checks
            .extend(checks);
        self
    }

    /// Adds checks to a constructor parameter.
    pub fn constructor_parameter(
        mut self,
        constructor: usize,
        index: usize,
        checks: impl IntoIterator<Item = Check>,
    ) -> Self {
        let position = match self
            .config
            .constructors
            .iter()
            .position(|c| c.index == constructor)
        {
            Some(position) => position,
            None => {
                self.config.constructors.push(ConstructorConfig {
                    index: constructor,
                    parameters: Vec::new(),
                    overwrite: None,
                });
                self.config.constructors.len() - 1
            }
        };
        parameter_entry(&mut self.config.constructors[position].parameters, index)
            .checks
            .extend(checks);
        self
    }

    /// Adds object-level checks.
    pub fn object(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.config
            .object
            .get_or_insert_with(ObjectConfig::default)
            .checks
            .extend(checks);
        self
    }

    pub fn check_invariants(mut self, enabled: bool) -> Self {
        self.config.check_invariants = Some(enabled);
        self
    }

    pub fn apply_field_constraints_to_setters(mut self, enabled: bool) -> Self {
        self.config.apply_field_constraints_to_setters = Some(enabled);
        self
    }

    pub fn apply_field_constraints_to_constructors(mut self, enabled: bool) -> Self {
        self.config.apply_field_constraints_to_constructors = Some(enabled);
        self
    }

    pub fn assert_parameters_not_null(mut self, enabled: bool) -> Self {
        self.config.assert_parameters_not_null = Some(enabled);
        self
    }

    pub fn inspect_interfaces(mut self, enabled: bool) -> Self {
        self.config.inspect_interfaces = Some(enabled);
        self
    }

    /// Makes every section replace earlier configuration instead of appending.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.overwrite = Some(overwrite);
        self
    }

    /// Builds the class configuration.
    pub fn build(self) -> ClassConfig {
        self.config
    }

    fn return_value(
        mut self,
        method: impl Into<String>,
        arity: usize,
        is_invariant: bool,
        checks: impl IntoIterator<Item = Check>,
    ) -> Self {
        let method = self.method_entry(method.into(), arity);
        method.is_invariant |= is_invariant;
        method
            .return_value
            .get_or_insert_with(ReturnValueConfig::default)
            .checks
            .extend(checks);
        self
    }

    fn method_entry(&mut self, name: String, arity: usize) -> &mut MethodConfig {
        let methods = &mut self.config.methods;
        let position = match methods
            .iter()
            .position(|m| m.name == name && m.arity == arity)
        {
            Some(position) => position,
            None => {
                methods.push(MethodConfig::new(name, arity));
                methods.len() - 1
            }
        };
        &mut methods[position]
    }
}

fn parameter_entry(parameters: &mut Vec<ParameterConfig>, index: usize) -> &mut ParameterConfig {
    if parameters.len() <= index {
        parameters.resize_with(index + 1, ParameterConfig::default);
    }
    &mut parameters[index]
}

/// Builder for creating a [`ConstraintSetConfig`].
///
/// # Example
///
/// ```rust
/// use constraints_core::{Check, ConstraintSetBuilder};
///
/// let set = ConstraintSetBuilder::new("person_name")
///     .check(Check::not_null())
///     .check(Check::length(1, 20))
///     .build();
/// assert_eq!(set.checks.len(), 2);
/// ```
#[derive(Debug)]
pub struct ConstraintSetBuilder {
    id: String,
    checks: Vec<Check>,
    overwrite: Option<bool>,
}

impl ConstraintSetBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            checks: Vec::new(),
            overwrite: None,
        }
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn checks(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.checks.extend(checks);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }

    pub fn build(self) -> ConstraintSetConfig {
        ConstraintSetConfig {
            id: self.id,
            checks: self.checks,
            overwrite: self.overwrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_config_builder_minimal() {
        let config = ClassConfigBuilder::new("Person").build();
        assert_eq!(config.class, "Person");
        assert!(config.fields.is_empty());
        assert!(config.object.is_none());
        assert_eq!(config.check_invariants, None);
    }

    #[test]
    fn test_field_checks_accumulate() {
        let config = ClassConfigBuilder::new("Person")
            .field("name", [Check::not_null()])
            .field("name", [Check::max_length(5)])
            .field("email", [Check::email()])
            .build();
        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[0].checks.len(), 2);
        assert_eq!(config.fields[1].name, "email");
    }

    #[test]
    fn test_method_sections_share_entry() {
        let config = ClassConfigBuilder::new("Person")
            .method_parameter("rename", 2, 1, [Check::not_blank()])
            .method_return_value("rename", 2, [Check::not_null()])
            .invariant("getAge", [Check::min(0.0)])
            .build();
        assert_eq!(config.methods.len(), 2);

        let rename = &config.methods[0];
        assert_eq!(rename.arity, 2);
        assert!(!rename.is_invariant);
        assert_eq!(rename.parameters.len(), 2);
        assert!(rename.parameters[0].checks.is_empty());
        assert_eq!(rename.parameters[1].checks.len(), 1);
        assert!(rename.return_value.is_some());

        let get_age = &config.methods[1];
        assert!(get_age.is_invariant);
        assert_eq!(get_age.arity, 0);
    }

    #[test]
    fn test_constructor_and_flags() {
        let config = ClassConfigBuilder::new("Person")
            .constructor_parameter(1, 0, [Check::not_null()])
            .constructor_parameter(1, 2, [Check::not_null()])
            .object([Check::assert_valid()])
            .apply_field_constraints_to_setters(true)
            .assert_parameters_not_null(true)
            .overwrite(true)
            .build();
        assert_eq!(config.constructors.len(), 1);
        assert_eq!(config.constructors[0].index, 1);
        assert_eq!(config.constructors[0].parameters.len(), 3);
        assert_eq!(config.object.map(|o| o.checks.len()), Some(1));
        assert_eq!(config.apply_field_constraints_to_setters, Some(true));
        assert_eq!(config.assert_parameters_not_null, Some(true));
        assert_eq!(config.overwrite, Some(true));
    }

    #[test]
    fn test_constraint_set_builder() {
        let set = ConstraintSetBuilder::new("ids")
            .checks([Check::not_null(), Check::min_length(3)])
            .overwrite(true)
            .build();
        assert_eq!(set.id, "ids");
        assert_eq!(set.checks.len(), 2);
        assert_eq!(set.overwrite, Some(true));
    }
}
