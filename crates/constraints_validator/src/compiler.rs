//! Compiles configurer output into a [`ClassChecks`] registry.

use crate::error::{Result, ValidationError};
use crate::registry::ClassChecks;
use constraints_core::{Check, ClassConfig, ClassRef, Configurer, ParameterConfig};
use std::sync::Arc;
use tracing::{debug, trace};

/// Builds the registry of `class` from every configurer, in order.
///
/// Later configurers append to earlier ones unless a section asks to
/// overwrite. The derived checks (setter and constructor field constraints,
/// not-null parameters) are added once all configurers were applied.
pub fn compile(class: &ClassRef, configurers: &[Arc<dyn Configurer>]) -> Result<ClassChecks> {
    let checks = ClassChecks::new(class.clone());
    for configurer in configurers {
        let config = configurer
            .class_configuration(class)
            .map_err(ValidationError::Configurer)?;
        if let Some(config) = config {
            trace!("Applying configuration of class {}", class.name());
            apply(&checks, &config)?;
        }
    }
    derive_checks(&checks)?;
    debug!(
        "Compiled checks of class {} ({} constrained fields, {} invariants)",
        class.name(),
        checks.constrained_fields().len() + checks.constrained_static_fields().len(),
        checks.invariants().len() + checks.static_invariants().len()
    );
    Ok(checks)
}

fn apply(checks: &ClassChecks, config: &ClassConfig) -> Result<()> {
    checks.update_flags(|flags| {
        let set = |slot: &mut bool, value: Option<bool>| {
            if let Some(value) = value {
                *slot = value;
            }
        };
        set(&mut flags.check_invariants, config.check_invariants);
        set(
            &mut flags.apply_field_constraints_to_setters,
            config.apply_field_constraints_to_setters,
        );
        set(
            &mut flags.apply_field_constraints_to_constructors,
            config.apply_field_constraints_to_constructors,
        );
        set(
            &mut flags.assert_parameters_not_null,
            config.assert_parameters_not_null,
        );
        set(&mut flags.inspect_interfaces, config.inspect_interfaces);
    });

    for field in &config.fields {
        if config.overwrite_for(field.overwrite) {
            checks.clear_field_checks(&field.name);
        }
        checks.add_field_checks(&field.name, field.checks.iter().cloned())?;
    }

    for method in &config.methods {
        if let Some(return_value) = &method.return_value {
            if config.overwrite_for(return_value.overwrite.or(method.overwrite)) {
                checks.clear_method_return_value_checks(&method.name, method.arity);
            }
            checks.add_method_return_value_checks(
                &method.name,
                method.arity,
                method.is_invariant,
                return_value.checks.iter().cloned(),
            )?;
        }
        for (index, parameter) in configured(&method.parameters) {
            if config.overwrite_for(parameter.overwrite.or(method.overwrite)) {
                checks.clear_method_parameter_checks(&method.name, method.arity, index);
            }
            checks.add_method_parameter_checks(
                &method.name,
                method.arity,
                index,
                parameter.checks.iter().cloned(),
            )?;
        }
    }

    for constructor in &config.constructors {
        for (index, parameter) in configured(&constructor.parameters) {
            if config.overwrite_for(parameter.overwrite.or(constructor.overwrite)) {
                checks.clear_constructor_parameter_checks(constructor.index, index);
            }
            checks.add_constructor_parameter_checks(
                constructor.index,
                index,
                parameter.checks.iter().cloned(),
            )?;
        }
    }

    if let Some(object) = &config.object {
        if config.overwrite_for(object.overwrite) {
            checks.clear_object_checks();
        }
        checks.add_object_checks(object.checks.iter().cloned());
    }
    Ok(())
}

/// Parameters with checks or an explicit overwrite, with their position.
fn configured(parameters: &[ParameterConfig]) -> impl Iterator<Item = (usize, &ParameterConfig)> {
    parameters
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.checks.is_empty() || p.overwrite.is_some())
}

fn derive_checks(checks: &ClassChecks) -> Result<()> {
    let flags = checks.flags();
    let class = checks.class().clone();

    if flags.apply_field_constraints_to_setters {
        let fields = checks
            .constrained_fields()
            .into_iter()
            .chain(checks.constrained_static_fields());
        for field in fields {
            let setter = setter_name(&field);
            if class.method(&setter, 1).is_none() {
                continue;
            }
            let existing = checks.method_parameter_checks(&setter, 1, 0);
            if !references_field(&existing, &field) {
                checks.add_method_parameter_checks(
                    &setter,
                    1,
                    0,
                    [Check::assert_field_constraints_in(class.name(), &field)],
                )?;
            }
        }
    }

    if flags.apply_field_constraints_to_constructors {
        let fields = checks.constrained_fields();
        for (ctor, info) in class.constructors().iter().enumerate() {
            for (index, param) in info.params.iter().enumerate() {
                let Some(name) = param.name.as_deref() else {
                    continue;
                };
                if !fields.iter().any(|f| f == name) {
                    continue;
                }
                let existing = checks.constructor_parameter_checks(ctor, index);
                if !references_field(&existing, name) {
                    checks.add_constructor_parameter_checks(
                        ctor,
                        index,
                        [Check::assert_field_constraints_in(class.name(), name)],
                    )?;
                }
            }
        }
    }

    if flags.assert_parameters_not_null {
        for method in class.methods() {
            for index in 0..method.arity() {
                let existing = checks.method_parameter_checks(&method.name, method.arity(), index);
                if !ClassChecks::has_not_null(&existing) {
                    checks.add_method_parameter_checks(
                        &method.name,
                        method.arity(),
                        index,
                        [Check::not_null()],
                    )?;
                }
            }
        }
        for (ctor, info) in class.constructors().iter().enumerate() {
            for index in 0..info.params.len() {
                let existing = checks.constructor_parameter_checks(ctor, index);
                if !ClassChecks::has_not_null(&existing) {
                    checks.add_constructor_parameter_checks(ctor, index, [Check::not_null()])?;
                }
            }
        }
    }
    Ok(())
}

fn setter_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

fn references_field(checks: &[Arc<Check>], field: &str) -> bool {
    checks.iter().any(|c| {
        matches!(
            c.kind(),
            constraints_core::CheckKind::AssertFieldConstraints { field: Some(f), .. } if f == field
        )
    })
}
