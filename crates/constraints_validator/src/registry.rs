//! Per-class check registry.
//!
//! [`ClassChecks`] holds the compiled checks of exactly one class level:
//! field checks, method return value and parameter checks, constructor
//! parameter checks and object-level checks, plus the ordered sets of
//! constrained members the engine iterates. Every collection sits behind
//! its own lock and readers only ever get cloned snapshots, so a validation
//! never holds a registry lock while it recurses.

use constraints_core::{Check, CheckKind, ClassRef, ConfigError, Context, MethodInfo, Result};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

type MethodKey = (String, usize);
type ParameterKey = (String, usize, usize);
type CheckMap<K> = RwLock<HashMap<K, Vec<Arc<Check>>>>;

/// Class level switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassFlags {
    /// Consulted by method guards to evaluate invariants around calls
    pub check_invariants: bool,
    pub apply_field_constraints_to_setters: bool,
    pub apply_field_constraints_to_constructors: bool,
    pub assert_parameters_not_null: bool,
    /// Also evaluate invariant getters declared on implemented interfaces,
    /// including the interfaces those extend
    pub inspect_interfaces: bool,
}

/// Compiled checks of one class.
#[derive(Debug)]
pub struct ClassChecks {
    class: ClassRef,
    flags: RwLock<ClassFlags>,
    field_checks: CheckMap<String>,
    method_return_value_checks: CheckMap<MethodKey>,
    method_parameter_checks: CheckMap<ParameterKey>,
    constructor_parameter_checks: CheckMap<(usize, usize)>,
    object_checks: RwLock<Vec<Arc<Check>>>,
    constrained_fields: RwLock<Vec<String>>,
    constrained_static_fields: RwLock<Vec<String>>,
    invariants: RwLock<Vec<String>>,
    static_invariants: RwLock<Vec<String>>,
}

impl ClassChecks {
    /// Creates an empty registry for `class`.
    pub fn new(class: ClassRef) -> Self {
        Self {
            class,
            flags: RwLock::default(),
            field_checks: RwLock::default(),
            method_return_value_checks: RwLock::default(),
            method_parameter_checks: RwLock::default(),
            constructor_parameter_checks: RwLock::default(),
            object_checks: RwLock::default(),
            constrained_fields: RwLock::default(),
            constrained_static_fields: RwLock::default(),
            invariants: RwLock::default(),
            static_invariants: RwLock::default(),
        }
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn flags(&self) -> ClassFlags {
        *self.flags.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Updates the flags in place.
    pub fn update_flags(&self, f: impl FnOnce(&mut ClassFlags)) {
        f(&mut self.flags.write().unwrap_or_else(PoisonError::into_inner));
    }

    // ---- fields ----

    /// Appends checks to a field declared by this class.
    ///
    /// Returns the registered checks, usable as removal handles.
    pub fn add_field_checks(
        &self,
        field: &str,
        checks: impl IntoIterator<Item = Check>,
    ) -> Result<Vec<Arc<Check>>> {
        let info = self
            .class
            .field(field)
            .ok_or_else(|| ConfigError::member_not_found(self.class.name(), "Field", field))?;
        let checks = freeze(checks, || Context::field(self.class.name(), field));
        if checks.is_empty() {
            return Ok(checks);
        }
        append(&self.field_checks, field.to_string(), &checks, || {
            insert_member(self.constrained_fields_of(info.is_static), field)
        });
        Ok(checks)
    }

    pub fn field_checks(&self, field: &str) -> Vec<Arc<Check>> {
        snapshot(&self.field_checks, field)
    }

    /// Removes the given checks (by identity) from a field.
    pub fn remove_field_checks(&self, field: &str, checks: &[Arc<Check>]) {
        remove(&self.field_checks, field, checks, || self.forget_field(field));
    }

    pub fn clear_field_checks(&self, field: &str) {
        clear(&self.field_checks, field, || self.forget_field(field));
    }

    /// Instance fields carrying checks, in registration order.
    pub fn constrained_fields(&self) -> Vec<String> {
        read_vec(&self.constrained_fields)
    }

    /// Static fields carrying checks, in registration order.
    pub fn constrained_static_fields(&self) -> Vec<String> {
        read_vec(&self.constrained_static_fields)
    }

    fn constrained_fields_of(&self, is_static: bool) -> &RwLock<Vec<String>> {
        if is_static {
            &self.constrained_static_fields
        } else {
            &self.constrained_fields
        }
    }

    fn forget_field(&self, field: &str) {
        remove_member(&self.constrained_fields, field);
        remove_member(&self.constrained_static_fields, field);
    }

    // ---- method return values ----

    /// Appends return value checks to a method declared by this class.
    ///
    /// Invariant methods are evaluated on every object validation and must
    /// take no parameters.
    pub fn add_method_return_value_checks(
        &self,
        method: &str,
        arity: usize,
        is_invariant: bool,
        checks: impl IntoIterator<Item = Check>,
    ) -> Result<Vec<Arc<Check>>> {
        let info = self.method_info(method, arity)?;
        if info.is_void() {
            return Err(ConfigError::VoidMethod {
                class: self.class.name().to_string(),
                method: method.to_string(),
            });
        }
        if is_invariant && arity != 0 {
            return Err(ConfigError::invalid(format!(
                "invariant method '{}.{}' must not take parameters",
                self.class.name(),
                method
            )));
        }
        let is_static = info.is_static;
        let checks = freeze(checks, || {
            Context::method_return_value(self.class.name(), method)
        });
        if checks.is_empty() {
            return Ok(checks);
        }
        append(
            &self.method_return_value_checks,
            (method.to_string(), arity),
            &checks,
            || {
                if is_invariant {
                    insert_member(self.invariants_of(is_static), method);
                }
            },
        );
        Ok(checks)
    }

    pub fn method_return_value_checks(&self, method: &str, arity: usize) -> Vec<Arc<Check>> {
        snapshot(&self.method_return_value_checks, &(method.to_string(), arity))
    }

    pub fn remove_method_return_value_checks(
        &self,
        method: &str,
        arity: usize,
        checks: &[Arc<Check>],
    ) {
        let key = (method.to_string(), arity);
        remove(&self.method_return_value_checks, &key, checks, || {
            self.forget_invariant(method, arity)
        });
    }

    pub fn clear_method_return_value_checks(&self, method: &str, arity: usize) {
        clear(&self.method_return_value_checks, &(method.to_string(), arity), || {
            self.forget_invariant(method, arity)
        });
    }

    /// Instance getters evaluated on every object validation.
    pub fn invariants(&self) -> Vec<String> {
        read_vec(&self.invariants)
    }

    /// Static getters evaluated on static validation.
    pub fn static_invariants(&self) -> Vec<String> {
        read_vec(&self.static_invariants)
    }

    fn invariants_of(&self, is_static: bool) -> &RwLock<Vec<String>> {
        if is_static {
            &self.static_invariants
        } else {
            &self.invariants
        }
    }

    fn forget_invariant(&self, method: &str, arity: usize) {
        if arity == 0 {
            remove_member(&self.invariants, method);
            remove_member(&self.static_invariants, method);
        }
    }

    // ---- method parameters ----

    /// Appends checks to a parameter of a method declared by this class.
    pub fn add_method_parameter_checks(
        &self,
        method: &str,
        arity: usize,
        index: usize,
        checks: impl IntoIterator<Item = Check>,
    ) -> Result<Vec<Arc<Check>>> {
        let info = self.method_info(method, arity)?;
        let param = info
            .params
            .get(index)
            .ok_or_else(|| ConfigError::ParameterIndexOutOfRange {
                member: format!("{}.{}", self.class.name(), method),
                index,
                count: info.arity(),
            })?;
        let checks = freeze(checks, || {
            Context::method_parameter(self.class.name(), method, index, param.name.clone())
        });
        if !checks.is_empty() {
            append(
                &self.method_parameter_checks,
                (method.to_string(), arity, index),
                &checks,
                || {},
            );
        }
        Ok(checks)
    }

    pub fn method_parameter_checks(
        &self,
        method: &str,
        arity: usize,
        index: usize,
    ) -> Vec<Arc<Check>> {
        snapshot(
            &self.method_parameter_checks,
            &(method.to_string(), arity, index),
        )
    }

    pub fn remove_method_parameter_checks(
        &self,
        method: &str,
        arity: usize,
        index: usize,
        checks: &[Arc<Check>],
    ) {
        remove(
            &self.method_parameter_checks,
            &(method.to_string(), arity, index),
            checks,
            || {},
        );
    }

    pub fn clear_method_parameter_checks(&self, method: &str, arity: usize, index: usize) {
        clear(
            &self.method_parameter_checks,
            &(method.to_string(), arity, index),
            || {},
        );
    }

    // ---- constructor parameters ----

    /// Appends checks to a parameter of the `constructor`-th constructor.
    pub fn add_constructor_parameter_checks(
        &self,
        constructor: usize,
        index: usize,
        checks: impl IntoIterator<Item = Check>,
    ) -> Result<Vec<Arc<Check>>> {
        let info = self.class.constructor(constructor).ok_or_else(|| {
            ConfigError::member_not_found(
                self.class.name(),
                "Constructor",
                format!("#{constructor}"),
            )
        })?;
        let param = info
            .params
            .get(index)
            .ok_or_else(|| ConfigError::ParameterIndexOutOfRange {
                member: format!("{}#{}", self.class.name(), constructor),
                index,
                count: info.params.len(),
            })?;
        let checks = freeze(checks, || {
            Context::constructor_parameter(self.class.name(), index, param.name.clone())
        });
        if !checks.is_empty() {
            append(
                &self.constructor_parameter_checks,
                (constructor, index),
                &checks,
                || {},
            );
        }
        Ok(checks)
    }

    pub fn constructor_parameter_checks(&self, constructor: usize, index: usize) -> Vec<Arc<Check>> {
        snapshot(&self.constructor_parameter_checks, &(constructor, index))
    }

    pub fn remove_constructor_parameter_checks(
        &self,
        constructor: usize,
        index: usize,
        checks: &[Arc<Check>],
    ) {
        remove(
            &self.constructor_parameter_checks,
            &(constructor, index),
            checks,
            || {},
        );
    }

    pub fn clear_constructor_parameter_checks(&self, constructor: usize, index: usize) {
        clear(&self.constructor_parameter_checks, &(constructor, index), || {});
    }

    // ---- object level ----

    pub fn add_object_checks(&self, checks: impl IntoIterator<Item = Check>) -> Vec<Arc<Check>> {
        let checks = freeze(checks, || Context::class(self.class.name()));
        self.object_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(checks.iter().cloned());
        checks
    }

    pub fn object_checks(&self) -> Vec<Arc<Check>> {
        read_vec(&self.object_checks)
    }

    pub fn remove_object_checks(&self, checks: &[Arc<Check>]) {
        self.object_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|c| !checks.iter().any(|r| Arc::ptr_eq(c, r)));
    }

    pub fn clear_object_checks(&self) {
        self.object_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Removes every check and resets the flags.
    pub fn clear(&self) {
        self.update_flags(|flags| *flags = ClassFlags::default());
        self.field_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.method_return_value_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.method_parameter_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.constructor_parameter_checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.clear_object_checks();
        for set in [
            &self.constrained_fields,
            &self.constrained_static_fields,
            &self.invariants,
            &self.static_invariants,
        ] {
            set.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Returns true if a check of the parameter is a `NotNull` check.
    pub(crate) fn has_not_null(checks: &[Arc<Check>]) -> bool {
        checks
            .iter()
            .any(|c| matches!(c.kind(), CheckKind::NotNull))
    }

    fn method_info(&self, method: &str, arity: usize) -> Result<&MethodInfo> {
        self.class.method(method, arity).ok_or_else(|| {
            ConfigError::member_not_found(self.class.name(), "Method", format!("{method}/{arity}"))
        })
    }
}

fn freeze(checks: impl IntoIterator<Item = Check>, context: impl Fn() -> Context) -> Vec<Arc<Check>> {
    checks
        .into_iter()
        .map(|mut check| {
            check.stamp_context(context());
            Arc::new(check)
        })
        .collect()
}

// membership callbacks run while the map is write-locked

fn append<K: Eq + Hash>(map: &CheckMap<K>, key: K, checks: &[Arc<Check>], then: impl FnOnce()) {
    let mut map = map.write().unwrap_or_else(PoisonError::into_inner);
    map.entry(key).or_default().extend(checks.iter().cloned());
    then();
}

fn snapshot<K, Q>(map: &CheckMap<K>, key: &Q) -> Vec<Arc<Check>>
where
    K: Eq + Hash + std::borrow::Borrow<Q>,
    Q: Eq + Hash + ?Sized,
{
    map.read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
        .unwrap_or_default()
}

/// Removes `checks` by identity, calling `on_empty` if the member has none left.
fn remove<K, Q>(map: &CheckMap<K>, key: &Q, checks: &[Arc<Check>], on_empty: impl FnOnce())
where
    K: Eq + Hash + std::borrow::Borrow<Q>,
    Q: Eq + Hash + ?Sized,
{
    let mut map = map.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = map.get_mut(key) {
        existing.retain(|c| !checks.iter().any(|r| Arc::ptr_eq(c, r)));
        if !existing.is_empty() {
            return;
        }
        map.remove(key);
    }
    on_empty();
}

fn clear<K, Q>(map: &CheckMap<K>, key: &Q, then: impl FnOnce())
where
    K: Eq + Hash + std::borrow::Borrow<Q>,
    Q: Eq + Hash + ?Sized,
{
    let mut map = map.write().unwrap_or_else(PoisonError::into_inner);
    map.remove(key);
    then();
}

fn read_vec<T: Clone>(lock: &RwLock<Vec<T>>) -> Vec<T> {
    lock.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn insert_member(set: &RwLock<Vec<String>>, member: &str) {
    let mut set = set.write().unwrap_or_else(PoisonError::into_inner);
    if !set.iter().any(|m| m == member) {
        set.push(member.to_string());
    }
}

fn remove_member(set: &RwLock<Vec<String>>, member: &str) {
    set.write()
        .unwrap_or_else(PoisonError::into_inner)
        .retain(|m| m != member);
}
