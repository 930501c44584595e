//! Runtime object model: classes, members and instances.
//!
//! A [`ClassInfo`] describes a type (fields, methods, constructors, its
//! superclass and interfaces) and owns the values of its static fields.
//! An [`Object`] is an instance holding field values. Methods are backed by
//! invoker closures so getters can compute their result from the instance.

use crate::error::AccessError;
use crate::value::{Value, ValueKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to a class descriptor.
pub type ClassRef = Arc<ClassInfo>;

/// Shared handle to an object instance.
pub type ObjectRef = Arc<Object>;

/// The receiver a method is invoked on.
#[derive(Clone, Copy)]
pub enum Receiver<'a> {
    /// Instance method call
    Instance(&'a Object),
    /// Static method call
    Class(&'a ClassInfo),
}

/// Closure backing a method.
pub type Invoker =
    Arc<dyn Fn(Receiver<'_>, &[Value]) -> Result<Value, AccessError> + Send + Sync>;

/// A declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub kind: ValueKind,
    pub is_static: bool,
}

/// A declared method or constructor parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    /// Parameter name, when known
    pub name: Option<String>,
    pub kind: ValueKind,
}

impl ParamInfo {
    /// Creates a named parameter.
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: Some(name.into()),
            kind,
        }
    }

    /// Creates a parameter whose name is not known.
    pub fn unnamed(kind: ValueKind) -> Self {
        Self { name: None, kind }
    }
}

/// A declared method.
#[derive(Clone)]
pub struct MethodInfo {
    pub name: String,
    pub params: Vec<ParamInfo>,
    /// Return kind, `None` for void methods
    pub returns: Option<ValueKind>,
    pub is_static: bool,
    invoker: Option<Invoker>,
}

impl MethodInfo {
    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns true if the method returns nothing.
    pub fn is_void(&self) -> bool {
        self.returns.is_none()
    }

    /// Returns true if the method can serve as a getter.
    pub fn is_getter(&self) -> bool {
        self.params.is_empty() && !self.is_void()
    }

    fn invoke(
        &self,
        class: &str,
        receiver: Receiver<'_>,
        args: &[Value],
    ) -> Result<Value, AccessError> {
        let invoker = self.invoker.as_ref().ok_or_else(|| AccessError::NotInvocable {
            class: class.to_string(),
            method: self.name.clone(),
        })?;
        invoker(receiver, args)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

/// A declared constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorInfo {
    pub params: Vec<ParamInfo>,
}

/// Runtime type descriptor.
pub struct ClassInfo {
    name: String,
    superclass: Option<ClassRef>,
    interfaces: Vec<ClassRef>,
    is_interface: bool,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    constructors: Vec<ConstructorInfo>,
    statics: RwLock<HashMap<String, Value>>,
}

impl ClassInfo {
    /// Returns the class name, which also serves as its identity token.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[ClassRef] {
        &self.interfaces
    }

    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// Fields declared by this class (not inherited ones).
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Methods declared by this class (not inherited ones).
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    /// Looks up a field declared by this class.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a method declared by this class.
    pub fn method(&self, name: &str, arity: usize) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arity() == arity)
    }

    pub fn constructor(&self, index: usize) -> Option<&ConstructorInfo> {
        self.constructors.get(index)
    }

    /// Iterates this class followed by its superclasses.
    pub fn hierarchy(&self) -> impl Iterator<Item = &ClassInfo> {
        std::iter::successors(Some(self), |c| c.superclass.as_deref())
    }

    /// Finds the class of the hierarchy declaring the named field.
    pub fn declaring_class_of_field(&self, name: &str) -> Option<&ClassInfo> {
        self.hierarchy().find(|c| c.field(name).is_some())
    }

    /// Finds a method by name and arity in the hierarchy.
    pub fn find_method(&self, name: &str, arity: usize) -> Option<(&ClassInfo, &MethodInfo)> {
        self.hierarchy()
            .find_map(|c| c.method(name, arity).map(|m| (c, m)))
    }

    /// Returns true if this class or a superclass has the given name.
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.hierarchy().any(|c| c.name == name)
    }

    /// Reads a static field of this class.
    pub fn get_static(&self, field: &str) -> Result<Value, AccessError> {
        match self.field(field) {
            Some(f) if f.is_static => {}
            _ => return Err(self.no_such_field(field)),
        }
        let statics = self.statics.read().unwrap_or_else(PoisonError::into_inner);
        Ok(statics.get(field).cloned().unwrap_or(Value::Null))
    }

    /// Writes a static field of this class.
    pub fn set_static(&self, field: &str, value: impl Into<Value>) -> Result<(), AccessError> {
        match self.field(field) {
            Some(f) if f.is_static => {}
            _ => return Err(self.no_such_field(field)),
        }
        let mut statics = self.statics.write().unwrap_or_else(PoisonError::into_inner);
        statics.insert(field.to_string(), value.into());
        Ok(())
    }

    /// Invokes a static method declared by this class.
    pub fn invoke_static(&self, method: &str, args: &[Value]) -> Result<Value, AccessError> {
        let m = self
            .method(method, args.len())
            .filter(|m| m.is_static)
            .ok_or_else(|| AccessError::NoSuchMethod {
                class: self.name.clone(),
                method: method.to_string(),
                arity: args.len(),
            })?;
        m.invoke(&self.name, Receiver::Class(self), args)
    }

    fn no_such_field(&self, field: &str) -> AccessError {
        AccessError::NoSuchField {
            class: self.name.clone(),
            field: field.to_string(),
        }
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name()))
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// Builder for creating a [`ClassInfo`].
///
/// # Example
///
/// ```rust
/// use constraints_core::{ClassBuilder, ValueKind};
///
/// let person = ClassBuilder::new("Person")
///     .field("name", ValueKind::String)
///     .getter("getName", ValueKind::String, |obj| obj.get("name"))
///     .build();
/// assert_eq!(person.name(), "Person");
/// ```
pub struct ClassBuilder {
    name: String,
    superclass: Option<ClassRef>,
    interfaces: Vec<ClassRef>,
    is_interface: bool,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    constructors: Vec<ConstructorInfo>,
    statics: HashMap<String, Value>,
}

impl ClassBuilder {
    /// Creates a builder for a concrete class.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            is_interface: false,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            statics: HashMap::new(),
        }
    }

    /// Creates a builder for an interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            is_interface: true,
            ..Self::new(name)
        }
    }

    /// Sets the superclass.
    pub fn extends(mut self, superclass: &ClassRef) -> Self {
        self.superclass = Some(superclass.clone());
        self
    }

    /// Adds an implemented interface.
    pub fn implements(mut self, interface: &ClassRef) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Declares an instance field.
    pub fn field(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            kind,
            is_static: false,
        });
        self
    }

    /// Declares a static field with its initial value.
    pub fn static_field(
        mut self,
        name: impl Into<String>,
        kind: ValueKind,
        initial: impl Into<Value>,
    ) -> Self {
        let name = name.into();
        self.statics.insert(name.clone(), initial.into());
        self.fields.push(FieldInfo {
            name,
            kind,
            is_static: true,
        });
        self
    }

    /// Declares an instance getter computed from the object.
    pub fn getter<F>(self, name: impl Into<String>, returns: ValueKind, f: F) -> Self
    where
        F: Fn(&Object) -> Result<Value, AccessError> + Send + Sync + 'static,
    {
        let name = name.into();
        let method = name.clone();
        let class = self.name.clone();
        self.push_method(name, Vec::new(), Some(returns), false, move |receiver, _| {
            match receiver {
                Receiver::Instance(obj) => f(obj),
                Receiver::Class(_) => Err(AccessError::invocation(
                    &class,
                    &method,
                    "instance getter invoked statically",
                )),
            }
        })
    }

    /// Declares a static getter computed from the class.
    pub fn static_getter<F>(self, name: impl Into<String>, returns: ValueKind, f: F) -> Self
    where
        F: Fn(&ClassInfo) -> Result<Value, AccessError> + Send + Sync + 'static,
    {
        self.push_method(name.into(), Vec::new(), Some(returns), true, move |receiver, _| {
            match receiver {
                Receiver::Class(c) => f(c),
                Receiver::Instance(obj) => f(obj.class()),
            }
        })
    }

    /// Declares an instance method with an invoker.
    pub fn method<F>(
        self,
        name: impl Into<String>,
        params: Vec<ParamInfo>,
        returns: Option<ValueKind>,
        f: F,
    ) -> Self
    where
        F: Fn(&Object, &[Value]) -> Result<Value, AccessError> + Send + Sync + 'static,
    {
        let name = name.into();
        let method = name.clone();
        let class = self.name.clone();
        self.push_method(name, params, returns, false, move |receiver, args| match receiver {
            Receiver::Instance(obj) => f(obj, args),
            Receiver::Class(_) => Err(AccessError::invocation(
                &class,
                &method,
                "instance method invoked statically",
            )),
        })
    }

    /// Declares a method without an implementation, as interfaces do.
    pub fn abstract_method(
        mut self,
        name: impl Into<String>,
        params: Vec<ParamInfo>,
        returns: Option<ValueKind>,
    ) -> Self {
        self.methods.push(MethodInfo {
            name: name.into(),
            params,
            returns,
            is_static: false,
            invoker: None,
        });
        self
    }

    /// Declares a constructor.
    pub fn constructor(mut self, params: Vec<ParamInfo>) -> Self {
        self.constructors.push(ConstructorInfo { params });
        self
    }

    fn push_method<F>(
        mut self,
        name: String,
        params: Vec<ParamInfo>,
        returns: Option<ValueKind>,
        is_static: bool,
        f: F,
    ) -> Self
    where
        F: Fn(Receiver<'_>, &[Value]) -> Result<Value, AccessError> + Send + Sync + 'static,
    {
        self.methods.push(MethodInfo {
            name,
            params,
            returns,
            is_static,
            invoker: Some(Arc::new(f)),
        });
        self
    }

    /// Builds the class.
    pub fn build(self) -> ClassRef {
        Arc::new(ClassInfo {
            name: self.name,
            superclass: self.superclass,
            interfaces: self.interfaces,
            is_interface: self.is_interface,
            fields: self.fields,
            methods: self.methods,
            constructors: self.constructors,
            statics: RwLock::new(self.statics),
        })
    }
}

/// An instance of a [`ClassInfo`].
///
/// Field names are unique across a class hierarchy; a subclass field with
/// the same name as a superclass field shares its storage.
pub struct Object {
    class: ClassRef,
    fields: RwLock<HashMap<String, Value>>,
}

impl Object {
    /// Creates an instance with every instance field set to `Null`.
    pub fn new(class: &ClassRef) -> ObjectRef {
        let fields = class
            .hierarchy()
            .flat_map(|c| c.fields.iter())
            .filter(|f| !f.is_static)
            .map(|f| (f.name.clone(), Value::Null))
            .collect();
        Arc::new(Self {
            class: class.clone(),
            fields: RwLock::new(fields),
        })
    }

    /// Creates an instance and assigns the given field values.
    pub fn with_values<'a, V: Into<Value>>(
        class: &ClassRef,
        values: impl IntoIterator<Item = (&'a str, V)>,
    ) -> Result<ObjectRef, AccessError> {
        let obj = Self::new(class);
        for (field, value) in values {
            obj.set(field, value)?;
        }
        Ok(obj)
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Reads an instance field.
    pub fn get(&self, field: &str) -> Result<Value, AccessError> {
        let fields = self.fields.read().unwrap_or_else(PoisonError::into_inner);
        fields
            .get(field)
            .cloned()
            .ok_or_else(|| self.no_such_field(field))
    }

    /// Writes an instance field.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<(), AccessError> {
        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);
        match fields.get_mut(field) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(self.no_such_field(field)),
        }
    }

    /// Invokes an instance method found in the class hierarchy.
    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, AccessError> {
        let (declaring, m) = self
            .class
            .find_method(method, args.len())
            .ok_or_else(|| AccessError::NoSuchMethod {
                class: self.class.name.clone(),
                method: method.to_string(),
                arity: args.len(),
            })?;
        m.invoke(&declaring.name, Receiver::Instance(self), args)
    }

    fn no_such_field(&self, field: &str) -> AccessError {
        AccessError::NoSuchField {
            class: self.class.name.clone(),
            field: field.to_string(),
        }
    }
}

impl fmt::Debug for Object {
    // fields are left out: graphs may be cyclic
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.class.name, self as *const Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn person() -> ClassRef {
        let base = ClassBuilder::new("Entity")
            .field("id", ValueKind::Int)
            .build();
        ClassBuilder::new("Person")
            .extends(&base)
            .field("name", ValueKind::String)
            .static_field("population", ValueKind::Int, 0)
            .getter("getName", ValueKind::String, |obj| obj.get("name"))
            .static_getter("getPopulation", ValueKind::Int, |c| c.get_static("population"))
            .build()
    }

    #[test]
    fn test_fields_span_hierarchy() {
        let class = person();
        let obj = Object::new(&class);
        assert_eq!(obj.get("id").unwrap(), Value::Null);
        obj.set("name", "Ada").unwrap();
        assert_eq!(obj.get("name").unwrap(), Value::from("Ada"));
        assert_eq!(
            class.declaring_class_of_field("id").map(|c| c.name()),
            Some("Entity")
        );
    }

    #[test]
    fn test_unknown_field_is_access_error() {
        let obj = Object::new(&person());
        assert!(matches!(
            obj.get("missing"),
            Err(AccessError::NoSuchField { .. })
        ));
        assert!(obj.set("population", 3).is_err());
    }

    #[test]
    fn test_getters_and_statics() {
        let class = person();
        let obj = Object::with_values(&class, [("name", "Grace")]).unwrap();
        assert_eq!(obj.invoke("getName", &[]).unwrap(), Value::from("Grace"));

        class.set_static("population", 7).unwrap();
        assert_eq!(class.invoke_static("getPopulation", &[]).unwrap(), Value::Int(7));
        assert!(class.invoke_static("getName", &[]).is_err());
    }

    #[test]
    fn test_abstract_method_not_invocable() {
        let iface = ClassBuilder::interface("Named")
            .abstract_method("getLabel", vec![], Some(ValueKind::String))
            .build();
        let class = ClassBuilder::new("Thing").implements(&iface).build();
        let obj = Object::new(&class);
        assert!(matches!(
            obj.invoke("getLabel", &[]),
            Err(AccessError::NoSuchMethod { .. })
        ));
        assert!(iface.is_interface());
        assert!(iface.method("getLabel", 0).unwrap().is_getter());
    }
}
