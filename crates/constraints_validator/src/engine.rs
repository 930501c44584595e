//! Main validation engine.
//!
//! This module provides the [`Validator`] that resolves the compiled checks
//! of a class and its superclasses, evaluates them against an object graph
//! and collects the violations.

use crate::compiler;
use crate::config::ValidatorConfig;
use crate::constraint_set::{ConstraintSet, ConstraintSets};
use crate::constraints;
use crate::cycle::CycleGuard;
use crate::error::{Result, ValidationError, registry_error};
use crate::expression::ExpressionLanguages;
use crate::message::{MessageResolver, render};
use crate::profiles::ProfileSettings;
use crate::registry::ClassChecks;
use constraints_core::{
    Check, CheckKind, ClassRef, ConfigError, Configurer, ConstraintTarget, Context,
    ExpressionLanguage, ObjectRef, Value, ValueKind, Violation,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, trace};

/// Compiled checks of a class, filled on first use.
type ClassSlot = Mutex<Option<Arc<ClassChecks>>>;

/// State of one top-level validation call.
struct Run<'p> {
    guard: CycleGuard,
    /// Call-scoped profiles, authoritative when present
    profiles: Option<&'p [String]>,
    /// Class in scope when no object is (constructor and static validation)
    scope: Option<ClassRef>,
}

impl<'p> Run<'p> {
    fn new(profiles: Option<&'p [String]>, scope: Option<ClassRef>) -> Self {
        Self {
            guard: CycleGuard::new(),
            profiles,
            scope,
        }
    }
}

/// Validation engine for constrained object graphs.
///
/// # Example
///
/// ```rust
/// use constraints_core::{Check, ClassBuilder, Object, ValueKind};
/// use constraints_validator::Validator;
///
/// let person = ClassBuilder::new("Person")
///     .field("name", ValueKind::String)
///     .build();
/// let validator = Validator::new();
/// validator.add_field_checks(&person, "name", [Check::not_null()]).unwrap();
///
/// let nobody = Object::new(&person);
/// let violations = validator.validate(&nobody).unwrap();
/// assert_eq!(violations.len(), 1);
/// assert_eq!(violations[0].message, "Person.name cannot be null");
/// ```
pub struct Validator {
    configurers: Vec<Arc<dyn Configurer>>,
    languages: ExpressionLanguages,
    message_resolver: Arc<dyn MessageResolver>,
    class_checks: RwLock<HashMap<String, Arc<ClassSlot>>>,
    constraint_sets: ConstraintSets,
    profiles: ProfileSettings,
}

impl Validator {
    /// Creates a validator with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::new())
    }

    /// Creates a validator from an explicit configuration.
    pub fn with_config(config: ValidatorConfig) -> Self {
        let languages = ExpressionLanguages::new();
        for (id, language) in config.expression_languages {
            languages.register(id, language);
        }
        let profiles = ProfileSettings::new();
        if !config.all_profiles_enabled {
            profiles.disable_all();
        }
        Self {
            configurers: config.configurers,
            languages,
            message_resolver: config.message_resolver,
            class_checks: RwLock::default(),
            constraint_sets: ConstraintSets::new(),
            profiles,
        }
    }

    // ---- validation entry points ----

    /// Validates an object and everything it cascades into.
    ///
    /// Returns the violations in evaluation order; an empty list means the
    /// object is valid.
    pub fn validate(&self, object: &ObjectRef) -> Result<Vec<Violation>> {
        self.validate_with(object, None)
    }

    /// Validates an object considering only checks of the given profiles.
    ///
    /// The profile list replaces the global profile settings for this call.
    pub fn validate_with_profiles(
        &self,
        object: &ObjectRef,
        profiles: &[&str],
    ) -> Result<Vec<Violation>> {
        let profiles: Vec<String> = profiles.iter().map(|p| p.to_string()).collect();
        self.validate_with(object, Some(&profiles))
    }

    fn validate_with(
        &self,
        object: &ObjectRef,
        profiles: Option<&[String]>,
    ) -> Result<Vec<Violation>> {
        debug!("Validating {:?}", object);
        let mut run = Run::new(profiles, None);
        let mut violations = Vec::new();
        self.validate_object(&mut run, object, &mut violations)
            .map_err(|e| e.wrap(format!("{object:?}")))?;
        debug!(
            "Validation of {:?} finished: {} violation(s), {} object(s) visited",
            object,
            violations.len(),
            run.guard.len()
        );
        Ok(violations)
    }

    /// Validates the static fields and static invariants of exactly `class`.
    ///
    /// Superclasses are not walked and object-level checks do not apply.
    pub fn validate_static(&self, class: &ClassRef) -> Result<Vec<Violation>> {
        debug!("Validating static members of {}", class.name());
        let mut run = Run::new(None, Some(class.clone()));
        let mut violations = Vec::new();
        self.validate_static_members(&mut run, class, &mut violations)
            .map_err(|e| e.wrap(class.name()))?;
        Ok(violations)
    }

    /// Validates a candidate value against the checks of `field` without
    /// assigning it.
    pub fn validate_field_value(
        &self,
        object: &ObjectRef,
        field: &str,
        candidate: &Value,
    ) -> Result<Vec<Violation>> {
        let declaring = lineage(object.class())
            .into_iter()
            .find(|c| c.field(field).is_some())
            .ok_or_else(|| {
                ValidationError::invalid_argument(format!(
                    "class {} has no field '{}'",
                    object.class().name(),
                    field
                ))
            })?;
        let mut run = Run::new(None, None);
        run.guard.enter(object);
        let mut violations = Vec::new();
        let context = Context::field(declaring.name(), field);
        let declared = field_kind(&declaring, field);
        self.class_checks(&declaring)
            .and_then(|checks| {
                self.check_all(
                    &mut run,
                    &checks.field_checks(field),
                    Some(object),
                    candidate,
                    &declared,
                    &context,
                    &mut violations,
                )
            })
            .map_err(|e| e.wrap(&context))?;
        Ok(violations)
    }

    /// Validates the arguments of a method call before it happens.
    pub fn validate_method_parameters(
        &self,
        object: &ObjectRef,
        method: &str,
        args: &[Value],
    ) -> Result<Vec<Violation>> {
        let declaring = self.declaring_class_of_method(object, method, args.len())?;
        let params = declaring
            .method(method, args.len())
            .map(|m| m.params.clone())
            .unwrap_or_default();
        let mut run = Run::new(None, None);
        run.guard.enter(object);
        let mut violations = Vec::new();
        let result = self.class_checks(&declaring).and_then(|checks| {
            for (index, arg) in args.iter().enumerate() {
                let name = params.get(index).and_then(|p| p.name.clone());
                let context = Context::method_parameter(declaring.name(), method, index, name);
                let param_checks = checks.method_parameter_checks(method, args.len(), index);
                let declared = params.get(index).map(|p| p.kind.clone()).unwrap_or_default();
                self.check_all(
                    &mut run,
                    &param_checks,
                    Some(object),
                    arg,
                    &declared,
                    &context,
                    &mut violations,
                )?;
            }
            Ok(())
        });
        result.map_err(|e| e.wrap(format!("{}.{}", declaring.name(), method)))?;
        Ok(violations)
    }

    /// Validates the arguments of a constructor call before it happens.
    pub fn validate_constructor_parameters(
        &self,
        class: &ClassRef,
        constructor: usize,
        args: &[Value],
    ) -> Result<Vec<Violation>> {
        let info = class.constructor(constructor).ok_or_else(|| {
            ValidationError::invalid_argument(format!(
                "class {} has no constructor #{}",
                class.name(),
                constructor
            ))
        })?;
        if info.params.len() != args.len() {
            return Err(ValidationError::invalid_argument(format!(
                "constructor #{} of {} takes {} argument(s), got {}",
                constructor,
                class.name(),
                info.params.len(),
                args.len()
            )));
        }
        let mut run = Run::new(None, Some(class.clone()));
        let mut violations = Vec::new();
        let result = self.class_checks(class).and_then(|checks| {
            for (index, (arg, param)) in args.iter().zip(&info.params).enumerate() {
                let context = Context::constructor_parameter(class.name(), index, param.name.clone());
                let param_checks = checks.constructor_parameter_checks(constructor, index);
                self.check_all(
                    &mut run,
                    &param_checks,
                    None,
                    arg,
                    &param.kind,
                    &context,
                    &mut violations,
                )?;
            }
            Ok(())
        });
        result.map_err(|e| e.wrap(format!("{}#{}", class.name(), constructor)))?;
        Ok(violations)
    }

    /// Validates the value a method returned.
    pub fn validate_method_return_value(
        &self,
        object: &ObjectRef,
        method: &str,
        arity: usize,
        value: &Value,
    ) -> Result<Vec<Violation>> {
        let declaring = self.declaring_class_of_method(object, method, arity)?;
        let mut run = Run::new(None, None);
        run.guard.enter(object);
        let mut violations = Vec::new();
        let context = Context::method_return_value(declaring.name(), method);
        let declared = return_kind(&declaring, method, arity);
        self.class_checks(&declaring)
            .and_then(|checks| {
                self.check_all(
                    &mut run,
                    &checks.method_return_value_checks(method, arity),
                    Some(object),
                    value,
                    &declared,
                    &context,
                    &mut violations,
                )
            })
            .map_err(|e| e.wrap(&context))?;
        Ok(violations)
    }

    /// Validates an object and fails with `ConstraintsViolated` if it is invalid.
    pub fn assert_valid(&self, object: &ObjectRef) -> Result<()> {
        let violations = self.validate(object)?;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ConstraintsViolated(violations))
        }
    }

    // ---- registry ----

    /// Returns the compiled checks of `class`, compiling them on first use.
    ///
    /// Lookups of one class wait for its compilation; different classes
    /// compile in parallel.
    pub fn class_checks(&self, class: &ClassRef) -> Result<Arc<ClassChecks>> {
        let slot = self.slot(class.name());
        let mut compiled = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(checks) = compiled.as_ref() {
            return Ok(checks.clone());
        }
        let checks = Arc::new(compiler::compile(class, &self.configurers)?);
        *compiled = Some(checks.clone());
        Ok(checks)
    }

    fn slot(&self, class: &str) -> Arc<ClassSlot> {
        if let Some(slot) = self
            .class_checks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class)
        {
            return slot.clone();
        }
        self.class_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(class.to_string())
            .or_default()
            .clone()
    }

    /// Drops the cached checks of the named class; returns true if cached.
    pub fn evict_class_checks(&self, class: &str) -> bool {
        let evicted = self
            .class_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(class)
            .is_some();
        if evicted {
            info!("Evicted checks of class {}", class);
        }
        evicted
    }

    /// Drops every cached class registry.
    pub fn clear_class_checks_cache(&self) {
        let mut cache = self
            .class_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        info!("Clearing checks of {} class(es)", cache.len());
        cache.clear();
    }

    /// Recompiles the checks of `class` from the configurers.
    ///
    /// Checks added programmatically since the last compilation are lost.
    pub fn reconfigure(&self, class: &ClassRef) -> Result<Arc<ClassChecks>> {
        self.evict_class_checks(class.name());
        self.class_checks(class)
    }

    pub fn add_field_checks(
        &self,
        class: &ClassRef,
        field: &str,
        checks: impl IntoIterator<Item = Check>,
    ) -> Result<Vec<Arc<Check>>> {
        self.class_checks(class)?
            .add_field_checks(field, checks)
            .map_err(registry_error)
    }

    pub fn remove_field_checks(
        &self,
        class: &ClassRef,
        field: &str,
        checks: &[Arc<Check>],
    ) -> Result<()> {
        self.class_checks(class)?.remove_field_checks(field, checks);
        Ok(())
    }

    pub fn clear_field_checks(&self, class: &ClassRef, field: &str) -> Result<()> {
        self.class_checks(class)?.clear_field_checks(field);
        Ok(())
    }

    pub fn add_object_checks(
        &self,
        class: &ClassRef,
        checks: impl IntoIterator<Item = Check>,
    ) -> Result<Vec<Arc<Check>>> {
        Ok(self.class_checks(class)?.add_object_checks(checks))
    }

    pub fn remove_object_checks(&self, class: &ClassRef, checks: &[Arc<Check>]) -> Result<()> {
        self.class_checks(class)?.remove_object_checks(checks);
        Ok(())
    }

    pub fn add_method_return_value_checks(
        &self,
        class: &ClassRef,
        method: &str,
        arity: usize,
        is_invariant: bool,
        checks: impl IntoIterator<Item = Check>,
    ) -> Result<Vec<Arc<Check>>> {
        self.class_checks(class)?
            .add_method_return_value_checks(method, arity, is_invariant, checks)
            .map_err(registry_error)
    }

    pub fn add_method_parameter_checks(
        &self,
        class: &ClassRef,
        method: &str,
        arity: usize,
        index: usize,
        checks: impl IntoIterator<Item = Check>,
    ) -> Result<Vec<Arc<Check>>> {
        self.class_checks(class)?
            .add_method_parameter_checks(method, arity, index, checks)
            .map_err(registry_error)
    }

    pub fn add_constructor_parameter_checks(
        &self,
        class: &ClassRef,
        constructor: usize,
        index: usize,
        checks: impl IntoIterator<Item = Check>,
    ) -> Result<Vec<Arc<Check>>> {
        self.class_checks(class)?
            .add_constructor_parameter_checks(constructor, index, checks)
            .map_err(registry_error)
    }

    // ---- constraint sets ----

    /// Registers a constraint set.
    pub fn add_constraint_set(&self, set: ConstraintSet, overwrite: bool) -> Result<()> {
        self.constraint_sets.add(set, overwrite)
    }

    pub fn remove_constraint_set(&self, id: &str) -> Option<Arc<ConstraintSet>> {
        self.constraint_sets.remove(id)
    }

    /// Looks up a constraint set, asking the configurers if needed.
    pub fn constraint_set(&self, id: &str) -> Result<Arc<ConstraintSet>> {
        self.constraint_sets.resolve(id, &self.configurers)
    }

    // ---- profiles ----

    pub fn enable_profile(&self, profile: &str) {
        self.profiles.enable(profile);
    }

    pub fn disable_profile(&self, profile: &str) {
        self.profiles.disable(profile);
    }

    pub fn enable_all_profiles(&self) {
        self.profiles.enable_all();
    }

    pub fn disable_all_profiles(&self) {
        self.profiles.disable_all();
    }

    pub fn is_profile_enabled(&self, profile: &str) -> bool {
        self.profiles.is_enabled(profile)
    }

    // ---- expression languages ----

    pub fn add_expression_language(&self, id: impl Into<String>, language: Arc<dyn ExpressionLanguage>) {
        self.languages.register(id, language);
    }

    pub fn remove_expression_language(&self, id: &str) -> bool {
        self.languages.unregister(id)
    }

    // ---- traversal ----

    fn validate_object(
        &self,
        run: &mut Run<'_>,
        object: &ObjectRef,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        run.guard.enter(object);
        for class in lineage(object.class()) {
            self.validate_level(run, object, &class, out)?;
        }
        Ok(())
    }

    /// Evaluates the checks one class level declares for `object`.
    fn validate_level(
        &self,
        run: &mut Run<'_>,
        object: &ObjectRef,
        class: &ClassRef,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        let checks = self.class_checks(class)?;

        for field in checks.constrained_fields() {
            let value = object.get(&field)?;
            let context = Context::field(class.name(), &field);
            let declared = field_kind(class, &field);
            let field_checks = checks.field_checks(&field);
            self.check_all(run, &field_checks, Some(object), &value, &declared, &context, out)?;
        }

        self.validate_invariants(run, object, &checks, out)?;
        if checks.flags().inspect_interfaces {
            for interface in interfaces(class) {
                let interface_checks = self.class_checks(&interface)?;
                self.validate_invariants(run, object, &interface_checks, out)?;
            }
        }

        let value = Value::from(object);
        let declared = ValueKind::Object(class.name().to_string());
        let context = Context::class(class.name());
        let object_checks = checks.object_checks();
        self.check_all(run, &object_checks, Some(object), &value, &declared, &context, out)
    }

    fn validate_invariants(
        &self,
        run: &mut Run<'_>,
        object: &ObjectRef,
        checks: &ClassChecks,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        let class = checks.class();
        for method in checks.invariants() {
            let value = object.invoke(&method, &[])?;
            let declared = return_kind(class, &method, 0);
            let context = Context::method_return_value(class.name(), &method);
            let method_checks = checks.method_return_value_checks(&method, 0);
            self.check_all(run, &method_checks, Some(object), &value, &declared, &context, out)?;
        }
        Ok(())
    }

    fn validate_static_members(
        &self,
        run: &mut Run<'_>,
        class: &ClassRef,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        let checks = self.class_checks(class)?;
        for field in checks.constrained_static_fields() {
            let value = class.get_static(&field)?;
            let declared = field_kind(class, &field);
            let context = Context::field(class.name(), &field);
            let field_checks = checks.field_checks(&field);
            self.check_all(run, &field_checks, None, &value, &declared, &context, out)?;
        }
        for method in checks.static_invariants() {
            let value = class.invoke_static(&method, &[])?;
            let declared = return_kind(class, &method, 0);
            let context = Context::method_return_value(class.name(), &method);
            let method_checks = checks.method_return_value_checks(&method, 0);
            self.check_all(run, &method_checks, None, &value, &declared, &context, out)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn check_all(
        &self,
        run: &mut Run<'_>,
        checks: &[Arc<Check>],
        validated: Option<&ObjectRef>,
        value: &Value,
        declared: &ValueKind,
        context: &Context,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        for check in checks {
            self.check(run, check, validated, value, declared, context, out)?;
        }
        Ok(())
    }

    /// Applies profile, activation and target path gating to one check.
    #[allow(clippy::too_many_arguments)]
    fn check(
        &self,
        run: &mut Run<'_>,
        check: &Arc<Check>,
        validated: Option<&ObjectRef>,
        value: &Value,
        declared: &ValueKind,
        context: &Context,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        if !self.profiles.is_any_enabled(check.profiles(), run.profiles) {
            trace!("Skipping {} on {}: no active profile", check.name(), context);
            return Ok(());
        }
        if !constraints::is_active(check, validated, value, &self.languages)? {
            trace!("Skipping {} on {}: condition is false", check.name(), context);
            return Ok(());
        }
        match check.target() {
            Some(path) => match navigate(value, path)? {
                Some(target) => {
                    self.dispatch(run, check, validated, &target, &ValueKind::Any, context, out)
                }
                None => Ok(()),
            },
            None => self.dispatch(run, check, validated, value, declared, context, out),
        }
    }

    /// Applies a check to a container's parts and/or the value itself.
    ///
    /// A null member declared as a container counts as an empty container.
    #[allow(clippy::too_many_arguments)]
    fn dispatch(
        &self,
        run: &mut Run<'_>,
        check: &Arc<Check>,
        validated: Option<&ObjectRef>,
        value: &Value,
        declared: &ValueKind,
        context: &Context,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        let applies_to = check.applies_to();
        let any = ValueKind::Any;
        match value {
            Value::List(items) | Value::Array(items) => {
                if applies_to.contains(ConstraintTarget::Values) {
                    for (index, item) in items.iter().enumerate() {
                        let item_context = context.element(index);
                        self.dispatch(run, check, validated, item, &any, &item_context, out)?;
                    }
                }
            }
            Value::Map(entries) => {
                if applies_to.contains(ConstraintTarget::Keys) {
                    for (index, (key, _)) in entries.iter().enumerate() {
                        let key_context = context.map_key(index);
                        self.dispatch(run, check, validated, key, &any, &key_context, out)?;
                    }
                }
                if applies_to.contains(ConstraintTarget::Values) {
                    for (key, item) in entries {
                        let item_context = context.map_value(key.to_string());
                        self.dispatch(run, check, validated, item, &any, &item_context, out)?;
                    }
                }
            }
            _ => {}
        }
        let is_container = value.container_kind().is_some()
            || (value.is_null() && declared.container_kind().is_some());
        if !is_container || applies_to.contains(ConstraintTarget::Container) {
            self.evaluate(run, check, validated, value, declared, context, out)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        run: &mut Run<'_>,
        check: &Arc<Check>,
        validated: Option<&ObjectRef>,
        value: &Value,
        declared: &ValueKind,
        context: &Context,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        match check.kind() {
            CheckKind::AssertValid => self.cascade(run, check, validated, value, context, out),
            CheckKind::AssertConstraintSet { id } => {
                let set = self.constraint_set(id)?;
                self.check_all(run, set.checks(), validated, value, declared, context, out)
            }
            CheckKind::AssertFieldConstraints {
                field,
                declaring_class,
            } => {
                let checks = self.referenced_field_checks(
                    run,
                    validated,
                    field.as_deref(),
                    declaring_class.as_deref(),
                    context,
                )?;
                self.check_all(run, &checks, validated, value, declared, context, out)
            }
            _ => {
                if !constraints::is_satisfied(check, validated, value, context, &self.languages)? {
                    out.push(self.violation(check, validated, value, context, Vec::new()));
                }
                Ok(())
            }
        }
    }

    /// Validates a referenced object, nesting its violations.
    fn cascade(
        &self,
        run: &mut Run<'_>,
        check: &Arc<Check>,
        validated: Option<&ObjectRef>,
        value: &Value,
        context: &Context,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        let Value::Object(target) = value else {
            return Ok(());
        };
        if run.guard.contains(target) {
            trace!("Skipping cascade into {:?}: already validated", target);
            return Ok(());
        }
        let mut causes = Vec::new();
        self.validate_object(run, target, &mut causes)?;
        if !causes.is_empty() {
            out.push(self.violation(check, validated, value, context, causes));
        }
        Ok(())
    }

    /// Resolves the checks of the field a field-constraints reference points at.
    fn referenced_field_checks(
        &self,
        run: &Run<'_>,
        validated: Option<&ObjectRef>,
        field: Option<&str>,
        declaring_class: Option<&str>,
        context: &Context,
    ) -> Result<Vec<Arc<Check>>> {
        let field = match field {
            Some(field) => field.to_string(),
            None => context
                .inferred_field_name()
                .ok_or_else(|| ValidationError::field_not_resolved("?", context))?,
        };
        let scope = validated
            .map(|o| o.class().clone())
            .or_else(|| run.scope.clone())
            .ok_or_else(|| ValidationError::field_not_resolved(&field, context))?;
        let declaring = lineage(&scope)
            .into_iter()
            .filter(|c| declaring_class.is_none_or(|name| c.name() == name))
            .find(|c| c.field(&field).is_some())
            .ok_or_else(|| ValidationError::field_not_resolved(&field, context))?;
        Ok(self.class_checks(&declaring)?.field_checks(&field))
    }

    fn declaring_class_of_method(
        &self,
        object: &ObjectRef,
        method: &str,
        arity: usize,
    ) -> Result<ClassRef> {
        lineage(object.class())
            .into_iter()
            .find(|c| c.method(method, arity).is_some())
            .ok_or_else(|| {
                ValidationError::invalid_argument(format!(
                    "class {} has no method '{}' with {} parameter(s)",
                    object.class().name(),
                    method,
                    arity
                ))
            })
    }

    fn violation(
        &self,
        check: &Arc<Check>,
        validated: Option<&ObjectRef>,
        value: &Value,
        context: &Context,
        causes: Vec<Violation>,
    ) -> Violation {
        let template = check.message();
        let error_code = check.error_code();
        let template = self
            .message_resolver
            .resolve(&template)
            .or_else(|| self.message_resolver.resolve(&error_code))
            .unwrap_or(template);

        let mut variables = vec![
            ("context".to_string(), context.to_string()),
            ("invalidValue".to_string(), value.to_string()),
        ];
        variables.extend(check.message_variables());

        Violation {
            check: check.clone(),
            check_name: check.name().to_string(),
            message: render(&template, &variables),
            message_template: template,
            error_code,
            severity: check.severity(),
            profiles: check.profiles().to_vec(),
            validated_object: validated.cloned(),
            invalid_value: value.clone(),
            context: context.clone(),
            causes,
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// The class followed by its superclasses.
fn lineage(class: &ClassRef) -> Vec<ClassRef> {
    std::iter::successors(Some(class.clone()), |c| c.superclass().cloned()).collect()
}

/// Interfaces implemented by `class`, including the ones they extend.
fn interfaces(class: &ClassRef) -> Vec<ClassRef> {
    let mut found: Vec<ClassRef> = Vec::new();
    let mut pending: Vec<ClassRef> = class.interfaces().iter().rev().cloned().collect();
    while let Some(interface) = pending.pop() {
        if found.iter().any(|seen| Arc::ptr_eq(seen, &interface)) {
            continue;
        }
        pending.extend(interface.interfaces().iter().rev().cloned());
        found.push(interface);
    }
    found
}

fn field_kind(class: &ClassRef, field: &str) -> ValueKind {
    class.field(field).map(|f| f.kind.clone()).unwrap_or_default()
}

fn return_kind(class: &ClassRef, method: &str, arity: usize) -> ValueKind {
    class
        .method(method, arity)
        .and_then(|m| m.returns.clone())
        .unwrap_or_default()
}

/// Follows a dotted path of field names (or map keys) from `value`.
///
/// Returns `None` when a `Null` is met before the end of the path.
fn navigate(value: &Value, path: &str) -> Result<Option<Value>> {
    let mut current = value.clone();
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match &current {
            Value::Null => return Ok(None),
            Value::Object(object) => object.get(segment)?,
            Value::Map(entries) => entries
                .iter()
                .find(|(key, _)| key.as_str() == Some(segment))
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null),
            other => {
                return Err(ConfigError::invalid(format!(
                    "cannot resolve '{}' of target path '{}' on a {} value",
                    segment,
                    path,
                    other.type_name()
                ))
                .into());
            }
        };
    }
    Ok(Some(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use constraints_core::{ClassBuilder, Object};
    use pretty_assertions::assert_eq;

    fn address() -> ClassRef {
        ClassBuilder::new("Address")
            .field("city", ValueKind::String)
            .build()
    }

    #[test]
    fn test_navigate() {
        let address_class = address();
        let address = Object::with_values(&address_class, [("city", "Rome")]).unwrap();
        let value = Value::from(&address);
        assert_eq!(navigate(&value, "city").unwrap(), Some(Value::from("Rome")));
        assert_eq!(navigate(&Value::Null, "city").unwrap(), None);
        assert_eq!(
            navigate(&Value::map([("k", "v")]), "k").unwrap(),
            Some(Value::from("v"))
        );
        assert!(navigate(&Value::from(3), "city").is_err());
        assert!(matches!(
            navigate(&value, "zip"),
            Err(ValidationError::Access(_))
        ));
    }

    #[test]
    fn test_lineage() {
        let base = ClassBuilder::new("Base").build();
        let derived = ClassBuilder::new("Derived").extends(&base).build();
        let names: Vec<_> = lineage(&derived).iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["Derived", "Base"]);
    }

    #[test]
    fn test_interfaces_include_extended_ones() {
        let named = ClassBuilder::interface("Named").build();
        let labeled = ClassBuilder::interface("Labeled").implements(&named).build();
        let audited = ClassBuilder::interface("Audited").implements(&named).build();
        let item = ClassBuilder::new("Item")
            .implements(&labeled)
            .implements(&audited)
            .build();
        let names: Vec<_> = interfaces(&item).iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["Labeled", "Named", "Audited"]);
    }

    #[test]
    fn test_class_checks_are_cached_until_evicted() {
        let validator = Validator::new();
        let class = address();
        let first = validator.class_checks(&class).unwrap();
        let second = validator.class_checks(&class).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(validator.evict_class_checks("Address"));
        assert!(!validator.evict_class_checks("Address"));
        let third = validator.class_checks(&class).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_target_path() {
        let address_class = address();
        let person = ClassBuilder::new("Person")
            .field("address", ValueKind::Object("Address".into()))
            .build();
        let validator = Validator::new();
        validator
            .add_field_checks(
                &person,
                "address",
                [Check::not_null().with_target("city")],
            )
            .unwrap();

        let homeless = Object::new(&person);
        assert!(validator.validate(&homeless).unwrap().is_empty());

        let nowhere = Object::new(&address_class);
        let someone = Object::with_values(&person, [("address", &nowhere)]).unwrap();
        let violations = validator.validate(&someone).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].invalid_value, Value::Null);
    }

    #[test]
    fn test_message_rendering() {
        let person = ClassBuilder::new("Person")
            .field("name", ValueKind::String)
            .build();
        let validator = Validator::new();
        validator
            .add_field_checks(
                &person,
                "name",
                [Check::length(2, 4).with_message("{context}: '{invalidValue}' not in {min}..{max}")],
            )
            .unwrap();
        let obj = Object::with_values(&person, [("name", "Bartholomew")]).unwrap();
        let violations = validator.validate(&obj).unwrap();
        assert_eq!(
            violations[0].message,
            "Person.name: 'Bartholomew' not in 2..4"
        );
        assert_eq!(violations[0].error_code, "constraints.Length");
    }
}
