//! Validation contexts.
//!
//! A [`Context`] describes where a value came from: a field, a getter, a
//! method or constructor parameter, the object itself, or a position inside
//! a container held by one of those.

use std::fmt;

/// Location of a validated value.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// Value of a field
    Field { class: String, field: String },
    /// Return value of a method (getter)
    MethodReturnValue { class: String, method: String },
    /// Argument of a method call
    MethodParameter {
        class: String,
        method: String,
        index: usize,
        name: Option<String>,
    },
    /// Argument of a constructor call
    ConstructorParameter {
        class: String,
        index: usize,
        name: Option<String>,
    },
    /// The object itself (object-level checks)
    Class { class: String },
    /// Element of a collection or array
    Element { parent: Box<Context>, index: usize },
    /// Key of a map entry
    MapKey { parent: Box<Context>, index: usize },
    /// Value of a map entry
    MapValue { parent: Box<Context>, key: String },
}

impl Context {
    pub fn field(class: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Field {
            class: class.into(),
            field: field.into(),
        }
    }

    pub fn method_return_value(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MethodReturnValue {
            class: class.into(),
            method: method.into(),
        }
    }

    pub fn method_parameter(
        class: impl Into<String>,
        method: impl Into<String>,
        index: usize,
        name: Option<String>,
    ) -> Self {
        Self::MethodParameter {
            class: class.into(),
            method: method.into(),
            index,
            name,
        }
    }

    pub fn constructor_parameter(
        class: impl Into<String>,
        index: usize,
        name: Option<String>,
    ) -> Self {
        Self::ConstructorParameter {
            class: class.into(),
            index,
            name,
        }
    }

    pub fn class(class: impl Into<String>) -> Self {
        Self::Class {
            class: class.into(),
        }
    }

    /// Context of the element at `index` of the container described by `self`.
    pub fn element(&self, index: usize) -> Self {
        Self::Element {
            parent: Box::new(self.clone()),
            index,
        }
    }

    /// Context of the key at position `index` of the map described by `self`.
    pub fn map_key(&self, index: usize) -> Self {
        Self::MapKey {
            parent: Box::new(self.clone()),
            index,
        }
    }

    /// Context of the value stored under `key` in the map described by `self`.
    pub fn map_value(&self, key: impl Into<String>) -> Self {
        Self::MapValue {
            parent: Box::new(self.clone()),
            key: key.into(),
        }
    }

    /// The member context, with container positions stripped.
    pub fn root(&self) -> &Context {
        match self {
            Self::Element { parent, .. }
            | Self::MapKey { parent, .. }
            | Self::MapValue { parent, .. } => parent.root(),
            other => other,
        }
    }

    /// Name of the class owning the member.
    pub fn class_name(&self) -> &str {
        match self.root() {
            Self::Field { class, .. }
            | Self::MethodReturnValue { class, .. }
            | Self::MethodParameter { class, .. }
            | Self::ConstructorParameter { class, .. }
            | Self::Class { class } => class,
            // root() never returns a container position
            Self::Element { .. } | Self::MapKey { .. } | Self::MapValue { .. } => "",
        }
    }

    /// Best guess of the field the member corresponds to.
    ///
    /// Fields map to themselves, constructor parameters to their name, method
    /// parameters to their name or else to the property of a setter, and
    /// return values to the property of a getter.
    pub fn inferred_field_name(&self) -> Option<String> {
        match self.root() {
            Self::Field { field, .. } => Some(field.clone()),
            Self::ConstructorParameter { name, .. } => name.clone(),
            Self::MethodParameter { name, method, .. } => {
                name.clone().or_else(|| property_name(method))
            }
            Self::MethodReturnValue { method, .. } => property_name(method),
            _ => None,
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { class, field } => write!(f, "{class}.{field}"),
            Self::MethodReturnValue { class, method } => write!(f, "{class}.{method}()"),
            Self::MethodParameter {
                class,
                method,
                index,
                name,
            } => match name {
                Some(name) => write!(f, "{class}.{method}({name})"),
                None => write!(f, "{class}.{method}(arg{index})"),
            },
            Self::ConstructorParameter { class, index, name } => match name {
                Some(name) => write!(f, "{class}({name})"),
                None => write!(f, "{class}(arg{index})"),
            },
            Self::Class { class } => write!(f, "{class}"),
            Self::Element { parent, index } => write!(f, "{parent}[{index}]"),
            Self::MapKey { parent, index } => write!(f, "{parent}.keys[{index}]"),
            Self::MapValue { parent, key } => write!(f, "{parent}[{key}]"),
        }
    }
}

/// Derives a property name from an accessor name.
///
/// `getFoo`, `isFoo` and `setFoo` all map to `foo`. Returns `None` when the
/// name carries no accessor prefix.
pub fn property_name(accessor: &str) -> Option<String> {
    let rest = ["get", "set", "is"]
        .iter()
        .find_map(|prefix| accessor.strip_prefix(prefix))
        .filter(|rest| rest.chars().next().is_some_and(char::is_uppercase))?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display() {
        let field = Context::field("Person", "tags");
        assert_eq!(field.to_string(), "Person.tags");
        assert_eq!(field.element(3).to_string(), "Person.tags[3]");
        assert_eq!(
            Context::method_parameter("Person", "setName", 0, None).to_string(),
            "Person.setName(arg0)"
        );
        assert_eq!(
            Context::constructor_parameter("Person", 1, Some("age".into())).to_string(),
            "Person(age)"
        );
        assert_eq!(
            Context::field("Person", "scores").map_value("math").to_string(),
            "Person.scores[math]"
        );
    }

    #[test]
    fn test_property_name() {
        assert_eq!(property_name("getFirstName").as_deref(), Some("firstName"));
        assert_eq!(property_name("isActive").as_deref(), Some("active"));
        assert_eq!(property_name("setAge").as_deref(), Some("age"));
        assert_eq!(property_name("getter"), None);
        assert_eq!(property_name("compute"), None);
    }

    #[test]
    fn test_inferred_field_name() {
        assert_eq!(
            Context::constructor_parameter("Person", 0, Some("name".into())).inferred_field_name(),
            Some("name".to_string())
        );
        assert_eq!(
            Context::method_parameter("Person", "setEmail", 0, None).inferred_field_name(),
            Some("email".to_string())
        );
        assert_eq!(
            Context::method_return_value("Person", "getAge").inferred_field_name(),
            Some("age".to_string())
        );
        assert_eq!(
            Context::field("Person", "tags").element(2).inferred_field_name(),
            Some("tags".to_string())
        );
        assert_eq!(Context::class("Person").inferred_field_name(), None);
    }
}
