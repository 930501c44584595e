//! Serde model of constraint configuration documents.
//!
//! A document lists class configurations and constraint sets. Checks are
//! tagged by `type`; metadata such as `message` or `profiles` sits next to
//! the kind-specific keys.

use crate::{ParserError, Result};
use constraints_core::{
    Check, CheckKind, CheckPredicate, ClassConfig, ConstraintSetConfig, ConstraintTarget,
    ConstructorConfig, FieldConfig, MethodConfig, ObjectConfig, ParameterConfig,
    ReturnValueConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Root of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintsDocument {
    #[serde(default)]
    pub classes: Vec<ClassDocument>,
    #[serde(default)]
    pub constraint_sets: Vec<ConstraintSetDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDocument {
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_field_constraints_to_setters: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_field_constraints_to_constructors: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_invariants: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assert_parameters_not_null: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspect_interfaces: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
    #[serde(default)]
    pub methods: Vec<MethodDocument>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ChecksDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDocument {
    pub name: String,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

/// A list of checks with its own `overwrite` flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecksDocument {
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDocument {
    pub name: String,
    /// Defaults to the number of listed parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<usize>,
    #[serde(default)]
    pub invariant: bool,
    #[serde(default)]
    pub parameters: Vec<ChecksDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<ChecksDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDocument {
    pub index: usize,
    #[serde(default)]
    pub parameters: Vec<ChecksDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSetDocument {
    pub id: String,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

/// One check: its kind plus optional metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSpec {
    #[serde(flatten)]
    pub kind: CheckKindSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<Vec<ConstraintTarget>>,
    /// Activation condition, `language:expression`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Dotted path from the value to the checked member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Kind of a declared check, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckKindSpec {
    NotNull,
    Null,
    NotEmpty,
    NotBlank,
    Length {
        min: usize,
        max: usize,
    },
    MinLength {
        min: usize,
    },
    MaxLength {
        max: usize,
    },
    Size {
        min: usize,
        max: usize,
    },
    MinSize {
        min: usize,
    },
    MaxSize {
        max: usize,
    },
    Range {
        min: f64,
        max: f64,
    },
    Min {
        min: f64,
    },
    Max {
        max: f64,
    },
    Pattern {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        patterns: Vec<String>,
        /// All patterns must match (default) or any of them
        #[serde(default = "default_match_all")]
        match_all: bool,
    },
    Email,
    Url,
    Past,
    Future,
    AssertTrue,
    AssertFalse,
    MemberOf {
        values: Vec<String>,
        #[serde(default)]
        ignore_case: bool,
    },
    NotMemberOf {
        values: Vec<String>,
        #[serde(default)]
        ignore_case: bool,
    },
    Expression {
        language: String,
        expression: String,
    },
    AssertValid,
    AssertConstraintSet {
        id: String,
    },
    AssertFieldConstraints {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        declaring_class: Option<String>,
    },
    /// A predicate registered with the configurer under `name`
    Custom {
        name: String,
    },
}

fn default_match_all() -> bool {
    true
}

/// Named custom predicates a document may reference.
pub(crate) type Predicates = HashMap<String, Arc<dyn CheckPredicate>>;

impl CheckSpec {
    /// Builds the check, reporting problems against `location`.
    pub(crate) fn to_check(&self, location: &str, predicates: &Predicates) -> Result<Check> {
        let invalid = |reason: String| ParserError::InvalidCheck {
            location: location.to_string(),
            reason,
        };

        let mut check = match &self.kind {
            CheckKindSpec::NotNull => Check::not_null(),
            CheckKindSpec::Null => Check::null(),
            CheckKindSpec::NotEmpty => Check::not_empty(),
            CheckKindSpec::NotBlank => Check::not_blank(),
            CheckKindSpec::Length { min, max } => Check::length(*min, *max),
            CheckKindSpec::MinLength { min } => Check::min_length(*min),
            CheckKindSpec::MaxLength { max } => Check::max_length(*max),
            CheckKindSpec::Size { min, max } => Check::size(*min, *max),
            CheckKindSpec::MinSize { min } => Check::min_size(*min),
            CheckKindSpec::MaxSize { max } => Check::max_size(*max),
            CheckKindSpec::Range { min, max } => Check::range(*min, *max),
            CheckKindSpec::Min { min } => Check::min(*min),
            CheckKindSpec::Max { max } => Check::max(*max),
            CheckKindSpec::Pattern {
                pattern,
                patterns,
                match_all,
            } => {
                let sources: Vec<&str> = pattern
                    .iter()
                    .chain(patterns)
                    .map(String::as_str)
                    .collect();
                if sources.is_empty() {
                    return Err(invalid("pattern check without a pattern".to_string()));
                }
                Check::patterns(sources, *match_all).map_err(|e| invalid(e.to_string()))?
            }
            CheckKindSpec::Email => Check::email(),
            CheckKindSpec::Url => Check::url(),
            CheckKindSpec::Past => Check::past(),
            CheckKindSpec::Future => Check::future(),
            CheckKindSpec::AssertTrue => Check::assert_true(),
            CheckKindSpec::AssertFalse => Check::assert_false(),
            CheckKindSpec::MemberOf {
                values,
                ignore_case,
            } => Check::member_of(values.iter().cloned(), *ignore_case),
            CheckKindSpec::NotMemberOf {
                values,
                ignore_case,
            } => Check::not_member_of(values.iter().cloned(), *ignore_case),
            CheckKindSpec::Expression {
                language,
                expression,
            } => Check::expression(language, expression),
            CheckKindSpec::AssertValid => Check::assert_valid(),
            CheckKindSpec::AssertConstraintSet { id } => Check::assert_constraint_set(id),
            CheckKindSpec::AssertFieldConstraints {
                field,
                declaring_class,
            } => match (declaring_class, field) {
                (Some(class), Some(field)) => Check::assert_field_constraints_in(class, field),
                (None, Some(field)) => Check::assert_field_constraints_for(field),
                (None, None) => Check::assert_field_constraints(),
                (Some(_), None) => {
                    return Err(invalid(
                        "declaring_class requires an explicit field".to_string(),
                    ));
                }
            },
            CheckKindSpec::Custom { name } => {
                let predicate = predicates
                    .get(name)
                    .ok_or_else(|| invalid(format!("unknown custom predicate '{name}'")))?;
                Check::new(CheckKind::Custom(predicate.clone()))
            }
        };

        if let Some(message) = &self.message {
            check = check.with_message(message);
        }
        if let Some(error_code) = &self.error_code {
            check = check.with_error_code(error_code);
        }
        if let Some(severity) = self.severity {
            check = check.with_severity(severity);
        }
        if !self.profiles.is_empty() {
            check = check.with_profiles(self.profiles.iter().cloned());
        }
        if let Some(targets) = &self.applies_to {
            check = check.with_applies_to(targets.iter().copied());
        }
        if let Some(when) = &self.when {
            check = check.with_when(when).map_err(|e| invalid(e.to_string()))?;
        }
        if let Some(target) = &self.target {
            check = check.with_target(target);
        }
        Ok(check)
    }
}

fn to_checks(specs: &[CheckSpec], location: &str, predicates: &Predicates) -> Result<Vec<Check>> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| spec.to_check(&format!("{location}[{i}]"), predicates))
        .collect()
}

fn to_parameters(
    parameters: &[ChecksDocument],
    location: &str,
    predicates: &Predicates,
) -> Result<Vec<ParameterConfig>> {
    parameters
        .iter()
        .enumerate()
        .map(|(i, param)| {
            Ok(ParameterConfig {
                checks: to_checks(&param.checks, &format!("{location}.parameters[{i}]"), predicates)?,
                overwrite: param.overwrite,
            })
        })
        .collect()
}

impl ClassDocument {
    pub(crate) fn to_config(&self, predicates: &Predicates) -> Result<ClassConfig> {
        let class = &self.class;
        let fields = self
            .fields
            .iter()
            .map(|field| {
                Ok(FieldConfig {
                    name: field.name.clone(),
                    checks: to_checks(&field.checks, &format!("{class}.{}", field.name), predicates)?,
                    overwrite: field.overwrite,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let methods = self
            .methods
            .iter()
            .map(|method| {
                let location = format!("{class}.{}()", method.name);
                let return_value = method
                    .return_value
                    .as_ref()
                    .map(|rv| {
                        Ok::<_, ParserError>(ReturnValueConfig {
                            checks: to_checks(&rv.checks, &location, predicates)?,
                            overwrite: rv.overwrite,
                        })
                    })
                    .transpose()?;
                Ok(MethodConfig {
                    name: method.name.clone(),
                    arity: method.arity.unwrap_or(method.parameters.len()),
                    is_invariant: method.invariant,
                    parameters: to_parameters(&method.parameters, &location, predicates)?,
                    return_value,
                    overwrite: method.overwrite,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let constructors = self
            .constructors
            .iter()
            .map(|ctor| {
                let location = format!("{class}#{}", ctor.index);
                Ok(ConstructorConfig {
                    index: ctor.index,
                    parameters: to_parameters(&ctor.parameters, &location, predicates)?,
                    overwrite: ctor.overwrite,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let object = self
            .object
            .as_ref()
            .map(|object| {
                Ok::<_, ParserError>(ObjectConfig {
                    checks: to_checks(&object.checks, class, predicates)?,
                    overwrite: object.overwrite,
                })
            })
            .transpose()?;

        Ok(ClassConfig {
            class: class.clone(),
            apply_field_constraints_to_setters: self.apply_field_constraints_to_setters,
            apply_field_constraints_to_constructors: self.apply_field_constraints_to_constructors,
            check_invariants: self.check_invariants,
            assert_parameters_not_null: self.assert_parameters_not_null,
            inspect_interfaces: self.inspect_interfaces,
            overwrite: self.overwrite,
            fields,
            methods,
            constructors,
            object,
        })
    }
}

impl ConstraintSetDocument {
    pub(crate) fn to_config(&self, predicates: &Predicates) -> Result<ConstraintSetConfig> {
        Ok(ConstraintSetConfig {
            id: self.id.clone(),
            checks: to_checks(&self.checks, &self.id, predicates)?,
            overwrite: self.overwrite,
        })
    }
}
