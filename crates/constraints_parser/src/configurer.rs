//! A [`Configurer`] fed by configuration documents.

use crate::document::{ConstraintsDocument, Predicates};
use crate::{Result, parse_file, parse_toml, parse_yaml};
use constraints_core::{
    CheckPredicate, ClassConfig, ClassInfo, ConstraintSetConfig, Configurer,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Configurer serving class configurations and constraint sets loaded from
/// YAML or TOML documents.
///
/// Documents are converted into checks when loaded, so a broken check
/// definition is reported by the `load_*` call rather than during
/// validation. Custom predicates referenced by `type: custom` must be
/// registered before the documents using them are loaded.
///
/// # Example
///
/// ```rust
/// use constraints_parser::FileConfigurer;
///
/// let configurer = FileConfigurer::from_yaml_str(r#"
/// classes:
///   - class: Person
///     fields:
///       - name: name
///         checks:
///           - type: not_null
///           - type: max_length
///             max: 50
/// "#).unwrap();
/// assert!(configurer.has_class("Person"));
/// ```
#[derive(Default)]
pub struct FileConfigurer {
    predicates: Predicates,
    classes: HashMap<String, ClassConfig>,
    constraint_sets: HashMap<String, ConstraintSetConfig>,
}

impl FileConfigurer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut configurer = Self::new();
        configurer.load_yaml_str(content)?;
        Ok(configurer)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut configurer = Self::new();
        configurer.load_toml_str(content)?;
        Ok(configurer)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let mut configurer = Self::new();
        configurer.load_file(path)?;
        Ok(configurer)
    }

    /// Makes `predicate` available to documents as `type: custom, name: <name>`.
    pub fn register_predicate(
        &mut self,
        name: impl Into<String>,
        predicate: impl CheckPredicate + 'static,
    ) -> &mut Self {
        self.predicates.insert(name.into(), Arc::new(predicate));
        self
    }

    pub fn load_yaml_str(&mut self, content: &str) -> Result<()> {
        let document = parse_yaml(content)?;
        self.load(document)
    }

    pub fn load_toml_str(&mut self, content: &str) -> Result<()> {
        let document = parse_toml(content)?;
        self.load(document)
    }

    /// Loads a document file, detecting the format from its extension.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let document = parse_file(path)?;
        info!("Loaded constraints from {}", path.display());
        self.load(document)
    }

    /// Adds the classes and constraint sets of `document`.
    ///
    /// A class or set already loaded is extended, unless the new entry sets
    /// `overwrite`, in which case it replaces the earlier one.
    pub fn load(&mut self, document: ConstraintsDocument) -> Result<()> {
        // convert everything first so a failing document changes nothing
        let classes = document
            .classes
            .iter()
            .map(|class| class.to_config(&self.predicates))
            .collect::<Result<Vec<_>>>()?;
        let sets = document
            .constraint_sets
            .iter()
            .map(|set| set.to_config(&self.predicates))
            .collect::<Result<Vec<_>>>()?;

        for config in classes {
            debug!("Loaded configuration of class {}", config.class);
            match self.classes.get_mut(&config.class) {
                Some(existing) if !config.overwrite.unwrap_or(false) => {
                    merge_class(existing, config)
                }
                _ => {
                    self.classes.insert(config.class.clone(), config);
                }
            }
        }
        for config in sets {
            debug!("Loaded constraint set '{}'", config.id);
            match self.constraint_sets.get_mut(&config.id) {
                Some(existing) if !config.overwrite.unwrap_or(false) => {
                    existing.checks.extend(config.checks)
                }
                _ => {
                    self.constraint_sets.insert(config.id.clone(), config);
                }
            }
        }
        Ok(())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn has_constraint_set(&self, id: &str) -> bool {
        self.constraint_sets.contains_key(id)
    }
}

/// Appends the sections of `next` to `existing`; flags set in `next` win.
fn merge_class(existing: &mut ClassConfig, next: ClassConfig) {
    let flags = [
        (
            &mut existing.apply_field_constraints_to_setters,
            next.apply_field_constraints_to_setters,
        ),
        (
            &mut existing.apply_field_constraints_to_constructors,
            next.apply_field_constraints_to_constructors,
        ),
        (&mut existing.check_invariants, next.check_invariants),
        (
            &mut existing.assert_parameters_not_null,
            next.assert_parameters_not_null,
        ),
        (&mut existing.inspect_interfaces, next.inspect_interfaces),
    ];
    for (slot, value) in flags {
        if value.is_some() {
            *slot = value;
        }
    }
    existing.fields.extend(next.fields);
    existing.methods.extend(next.methods);
    existing.constructors.extend(next.constructors);
    if let Some(more) = next.object {
        match &mut existing.object {
            Some(object) => object.checks.extend(more.checks),
            None => existing.object = Some(more),
        }
    }
}

impl Configurer for FileConfigurer {
    fn class_configuration(&self, class: &ClassInfo) -> anyhow::Result<Option<ClassConfig>> {
        Ok(self.classes.get(class.name()).cloned())
    }

    fn constraint_set_configuration(
        &self,
        id: &str,
    ) -> anyhow::Result<Option<ConstraintSetConfig>> {
        Ok(self.constraint_sets.get(id).cloned())
    }
}

impl std::fmt::Debug for FileConfigurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigurer")
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("constraint_sets", &self.constraint_sets.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParserError;
    use pretty_assertions::assert_eq;

    const BASE: &str = r#"
classes:
  - class: Person
    apply_field_constraints_to_setters: true
    fields:
      - name: name
        checks:
          - type: not_null
constraint_sets:
  - id: code
    checks:
      - type: not_blank
"#;

    #[test]
    fn test_documents_are_merged() {
        let mut configurer = FileConfigurer::from_yaml_str(BASE).unwrap();
        configurer
            .load_toml_str(
                r#"
[[classes]]
class = "Person"
check_invariants = true

[[classes.fields]]
name = "age"
checks = [{ type = "range", min = 0, max = 150 }]

[[constraint_sets]]
id = "code"
checks = [{ type = "max_length", max = 8 }]
"#,
            )
            .unwrap();

        let person = &configurer.classes["Person"];
        let fields: Vec<_> = person.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["name", "age"]);
        assert_eq!(person.apply_field_constraints_to_setters, Some(true));
        assert_eq!(person.check_invariants, Some(true));

        let names: Vec<_> = configurer.constraint_sets["code"]
            .checks
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, vec!["NotBlank", "MaxLength"]);
    }

    #[test]
    fn test_overwrite_replaces_earlier_document() {
        let mut configurer = FileConfigurer::from_yaml_str(BASE).unwrap();
        configurer
            .load_yaml_str(
                r#"
classes:
  - class: Person
    overwrite: true
    fields:
      - name: nickname
        checks: [{type: not_empty}]
"#,
            )
            .unwrap();
        let person = &configurer.classes["Person"];
        assert_eq!(person.fields.len(), 1);
        assert_eq!(person.fields[0].name, "nickname");
        assert_eq!(person.apply_field_constraints_to_setters, None);
    }

    #[test]
    fn test_failing_document_changes_nothing() {
        let mut configurer = FileConfigurer::from_yaml_str(BASE).unwrap();
        let err = configurer
            .load_yaml_str(
                r#"
classes:
  - class: Order
    fields:
      - name: total
        checks: [{type: min, min: 0}]
      - name: code
        checks: [{type: assert_constraint_set, id: code}, {type: custom, name: Luhn}]
"#,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ParserError::InvalidCheck { ref location, .. } if location == "Order.code[1]"
        ));
        assert!(!configurer.has_class("Order"));
    }
}
