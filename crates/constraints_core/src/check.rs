//! Check definitions.
//!
//! A [`Check`] pairs a [`CheckKind`] (what is verified) with metadata: the
//! message template, error code, severity, profiles, container targets,
//! activation condition and target path. Checks are assembled by value and
//! frozen into `Arc<Check>` once registered.

use crate::context::Context;
use crate::error::{ConfigError, EvaluationError};
use crate::expression::When;
use crate::object::ObjectRef;
use crate::value::Value;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Name of the implicit profile of checks declaring none.
pub const DEFAULT_PROFILE: &str = "default";

/// Default severity of a check.
pub const DEFAULT_SEVERITY: i32 = 1;

/// Part of a container-typed value a check targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintTarget {
    /// Keys of a map
    Keys,
    /// Elements of a collection or array, values of a map
    Values,
    /// The container value itself
    Container,
}

/// Set of [`ConstraintTarget`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppliesTo {
    keys: bool,
    values: bool,
    container: bool,
}

impl AppliesTo {
    pub const CONTAINER: AppliesTo = AppliesTo {
        keys: false,
        values: false,
        container: true,
    };

    pub const VALUES: AppliesTo = AppliesTo {
        keys: false,
        values: true,
        container: false,
    };

    pub const KEYS: AppliesTo = AppliesTo {
        keys: true,
        values: false,
        container: false,
    };

    pub fn new(targets: impl IntoIterator<Item = ConstraintTarget>) -> Self {
        targets
            .into_iter()
            .fold(Self::default(), |acc, target| acc.with(target))
    }

    /// Returns a copy including `target`.
    pub fn with(mut self, target: ConstraintTarget) -> Self {
        match target {
            ConstraintTarget::Keys => self.keys = true,
            ConstraintTarget::Values => self.values = true,
            ConstraintTarget::Container => self.container = true,
        }
        self
    }

    pub fn contains(self, target: ConstraintTarget) -> bool {
        match target {
            ConstraintTarget::Keys => self.keys,
            ConstraintTarget::Values => self.values,
            ConstraintTarget::Container => self.container,
        }
    }

    pub fn targets(self) -> Vec<ConstraintTarget> {
        [
            ConstraintTarget::Keys,
            ConstraintTarget::Values,
            ConstraintTarget::Container,
        ]
        .into_iter()
        .filter(|t| self.contains(*t))
        .collect()
    }
}

/// User supplied predicate behind [`CheckKind::Custom`].
pub trait CheckPredicate: Send + Sync + fmt::Debug {
    /// Check name used in messages and error codes.
    fn name(&self) -> &str;

    /// Tests the value. Errors abort the validation instead of producing a violation.
    fn is_satisfied(
        &self,
        validated_object: Option<&ObjectRef>,
        value: &Value,
        context: &Context,
    ) -> Result<bool, EvaluationError>;

    fn default_message(&self) -> String {
        "{context} is invalid".to_string()
    }

    fn default_applies_to(&self) -> AppliesTo {
        AppliesTo::CONTAINER
    }

    /// Extra `{placeholder}` values for the message template.
    fn message_variables(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// What a check verifies.
#[derive(Debug, Clone)]
pub enum CheckKind {
    NotNull,
    Null,
    NotEmpty,
    NotBlank,
    Length { min: usize, max: usize },
    MinLength(usize),
    MaxLength(usize),
    Size { min: usize, max: usize },
    MinSize(usize),
    MaxSize(usize),
    Range { min: f64, max: f64 },
    Min(f64),
    Max(f64),
    /// String form must fully match all (or any) of the patterns
    Pattern {
        patterns: Vec<Regex>,
        sources: Vec<String>,
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
        ignore_case: bool,
    },
    NotMemberOf {
        values: Vec<String>,
        ignore_case: bool,
    },
    /// Evaluated by the named expression language
    Expression { language: String, expression: String },
    Custom(Arc<dyn CheckPredicate>),
    /// Cascade into the referenced object
    AssertValid,
    /// Apply the checks of a named constraint set
    AssertConstraintSet { id: String },
    /// Apply the checks registered for a field
    AssertFieldConstraints {
        field: Option<String>,
        declaring_class: Option<String>,
    },
}

/// A constraint predicate plus its metadata.
///
/// # Example
///
/// ```rust
/// use constraints_core::{Check, ConstraintTarget};
///
/// let check = Check::max_length(10)
///     .with_profiles(["create"])
///     .with_severity(2)
///     .with_applies_to([ConstraintTarget::Values]);
/// assert_eq!(check.name(), "MaxLength");
/// assert_eq!(check.error_code(), "constraints.MaxLength");
/// ```
#[derive(Debug, Clone)]
pub struct Check {
    kind: CheckKind,
    message: Option<String>,
    error_code: Option<String>,
    severity: i32,
    profiles: Vec<String>,
    applies_to: Option<AppliesTo>,
    when: Option<When>,
    target: Option<String>,
    context: Option<Context>,
}

impl Check {
    /// Creates a check of the given kind with default metadata.
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            message: None,
            error_code: None,
            severity: DEFAULT_SEVERITY,
            profiles: Vec::new(),
            applies_to: None,
            when: None,
            target: None,
            context: None,
        }
    }

    pub fn not_null() -> Self {
        Self::new(CheckKind::NotNull)
    }

    pub fn null() -> Self {
        Self::new(CheckKind::Null)
    }

    pub fn not_empty() -> Self {
        Self::new(CheckKind::NotEmpty)
    }

    pub fn not_blank() -> Self {
        Self::new(CheckKind::NotBlank)
    }

    pub fn length(min: usize, max: usize) -> Self {
        Self::new(CheckKind::Length { min, max })
    }

    pub fn min_length(min: usize) -> Self {
        Self::new(CheckKind::MinLength(min))
    }

    pub fn max_length(max: usize) -> Self {
        Self::new(CheckKind::MaxLength(max))
    }

    pub fn size(min: usize, max: usize) -> Self {
        Self::new(CheckKind::Size { min, max })
    }

    pub fn min_size(min: usize) -> Self {
        Self::new(CheckKind::MinSize(min))
    }

    pub fn max_size(max: usize) -> Self {
        Self::new(CheckKind::MaxSize(max))
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self::new(CheckKind::Range { min, max })
    }

    pub fn min(min: f64) -> Self {
        Self::new(CheckKind::Min(min))
    }

    pub fn max(max: f64) -> Self {
        Self::new(CheckKind::Max(max))
    }

    /// Creates a check requiring a full match of `pattern`.
    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Self::patterns([pattern], true)
    }

    /// Creates a check requiring a full match of all (or any) patterns.
    pub fn patterns<'a>(
        patterns: impl IntoIterator<Item = &'a str>,
        match_all: bool,
    ) -> Result<Self, ConfigError> {
        let sources: Vec<String> = patterns.into_iter().map(str::to_string).collect();
        let compiled = sources
            .iter()
            .map(|p| {
                Regex::new(&format!("^(?:{p})$")).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.clone(),
                    error: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(CheckKind::Pattern {
            patterns: compiled,
            sources,
            match_all,
        }))
    }

    pub fn email() -> Self {
        Self::new(CheckKind::Email)
    }

    pub fn url() -> Self {
        Self::new(CheckKind::Url)
    }

    pub fn past() -> Self {
        Self::new(CheckKind::Past)
    }

    pub fn future() -> Self {
        Self::new(CheckKind::Future)
    }

    pub fn assert_true() -> Self {
        Self::new(CheckKind::AssertTrue)
    }

    pub fn assert_false() -> Self {
        Self::new(CheckKind::AssertFalse)
    }

    pub fn member_of<S: Into<String>>(values: impl IntoIterator<Item = S>, ignore_case: bool) -> Self {
        Self::new(CheckKind::MemberOf {
            values: values.into_iter().map(Into::into).collect(),
            ignore_case,
        })
    }

    pub fn not_member_of<S: Into<String>>(
        values: impl IntoIterator<Item = S>,
        ignore_case: bool,
    ) -> Self {
        Self::new(CheckKind::NotMemberOf {
            values: values.into_iter().map(Into::into).collect(),
            ignore_case,
        })
    }

    pub fn expression(language: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(CheckKind::Expression {
            language: language.into(),
            expression: expression.into(),
        })
    }

    pub fn custom(predicate: impl CheckPredicate + 'static) -> Self {
        Self::new(CheckKind::Custom(Arc::new(predicate)))
    }

    /// Cascades validation into the referenced object(s).
    pub fn assert_valid() -> Self {
        Self::new(CheckKind::AssertValid)
    }

    /// Applies the checks of the constraint set `id`.
    pub fn assert_constraint_set(id: impl Into<String>) -> Self {
        Self::new(CheckKind::AssertConstraintSet { id: id.into() })
    }

    /// Applies the checks of the field inferred from the validation context.
    pub fn assert_field_constraints() -> Self {
        Self::new(CheckKind::AssertFieldConstraints {
            field: None,
            declaring_class: None,
        })
    }

    /// Applies the checks of the named field.
    pub fn assert_field_constraints_for(field: impl Into<String>) -> Self {
        Self::new(CheckKind::AssertFieldConstraints {
            field: Some(field.into()),
            declaring_class: None,
        })
    }

    /// Applies the checks of the named field declared by `declaring_class`.
    pub fn assert_field_constraints_in(
        declaring_class: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self::new(CheckKind::AssertFieldConstraints {
            field: Some(field.into()),
            declaring_class: Some(declaring_class.into()),
        })
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    pub fn with_severity(mut self, severity: i32) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_profiles<S: Into<String>>(mut self, profiles: impl IntoIterator<Item = S>) -> Self {
        self.profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_applies_to(mut self, targets: impl IntoIterator<Item = ConstraintTarget>) -> Self {
        self.applies_to = Some(AppliesTo::new(targets));
        self
    }

    /// Sets the activation condition from `language:expression` syntax.
    pub fn with_when(self, when: &str) -> Result<Self, ConfigError> {
        Ok(self.with_condition(when.parse()?))
    }

    pub fn with_condition(mut self, when: When) -> Self {
        self.when = Some(when);
        self
    }

    /// Sets the dotted object path the check is applied to.
    pub fn with_target(mut self, path: impl Into<String>) -> Self {
        self.target = Some(path.into());
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the context unless one was configured explicitly.
    pub fn stamp_context(&mut self, context: Context) {
        if self.context.is_none() {
            self.context = Some(context);
        }
    }

    pub fn kind(&self) -> &CheckKind {
        &self.kind
    }

    /// Name of the check kind.
    pub fn name(&self) -> &str {
        match &self.kind {
            CheckKind::NotNull => "NotNull",
            CheckKind::Null => "Null",
            CheckKind::NotEmpty => "NotEmpty",
            CheckKind::NotBlank => "NotBlank",
            CheckKind::Length { .. } => "Length",
            CheckKind::MinLength(_) => "MinLength",
            CheckKind::MaxLength(_) => "MaxLength",
            CheckKind::Size { .. } => "Size",
            CheckKind::MinSize(_) => "MinSize",
            CheckKind::MaxSize(_) => "MaxSize",
            CheckKind::Range { .. } => "Range",
            CheckKind::Min(_) => "Min",
            CheckKind::Max(_) => "Max",
            CheckKind::Pattern { .. } => "Pattern",
            CheckKind::Email => "Email",
            CheckKind::Url => "Url",
            CheckKind::Past => "Past",
            CheckKind::Future => "Future",
            CheckKind::AssertTrue => "AssertTrue",
            CheckKind::AssertFalse => "AssertFalse",
            CheckKind::MemberOf { .. } => "MemberOf",
            CheckKind::NotMemberOf { .. } => "NotMemberOf",
            CheckKind::Expression { .. } => "Expression",
            CheckKind::Custom(predicate) => predicate.name(),
            CheckKind::AssertValid => "AssertValid",
            CheckKind::AssertConstraintSet { .. } => "AssertConstraintSet",
            CheckKind::AssertFieldConstraints { .. } => "AssertFieldConstraints",
        }
    }

    /// Message template, explicit or the kind's default.
    pub fn message(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        let template = match &self.kind {
            CheckKind::NotNull => "{context} cannot be null",
            CheckKind::Null => "{context} must be null",
            CheckKind::NotEmpty => "{context} cannot be empty",
            CheckKind::NotBlank => "{context} cannot be blank",
            CheckKind::Length { .. } => "{context} does not have a length between {min} and {max}",
            CheckKind::MinLength(_) => "{context} does not have a minimum length of {min}",
            CheckKind::MaxLength(_) => "{context} must not be longer than {max} characters",
            CheckKind::Size { .. } => "{context} does not have a size between {min} and {max}",
            CheckKind::MinSize(_) => "{context} does not have a minimum size of {min}",
            CheckKind::MaxSize(_) => "{context} must not have more than {max} elements",
            CheckKind::Range { .. } => "{context} is not in the range {min} - {max}",
            CheckKind::Min(_) => "{context} cannot be smaller than {min}",
            CheckKind::Max(_) => "{context} cannot be greater than {max}",
            CheckKind::Pattern { .. } => "{context} does not match the pattern {pattern}",
            CheckKind::Email => "{context} is not a valid email address",
            CheckKind::Url => "{context} is not a valid URL",
            CheckKind::Past => "{context} is not in the past",
            CheckKind::Future => "{context} is not in the future",
            CheckKind::AssertTrue => "{context} is not true",
            CheckKind::AssertFalse => "{context} is not false",
            CheckKind::MemberOf { .. } => "{context} must be one of {members}",
            CheckKind::NotMemberOf { .. } => "{context} must not be one of {members}",
            CheckKind::Expression { .. } => "{context} does not satisfy {expression}",
            CheckKind::Custom(predicate) => return predicate.default_message(),
            CheckKind::AssertValid => "{context} is invalid",
            CheckKind::AssertConstraintSet { .. } => {
                "{context} does not satisfy the constraint set {id}"
            }
            CheckKind::AssertFieldConstraints { .. } => {
                "{context} does not satisfy the field constraints"
            }
        };
        template.to_string()
    }

    /// Error code, explicit or `constraints.<Name>`.
    pub fn error_code(&self) -> String {
        self.error_code
            .clone()
            .unwrap_or_else(|| format!("constraints.{}", self.name()))
    }

    pub fn severity(&self) -> i32 {
        self.severity
    }

    /// Declared profiles; empty means the implicit default profile.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Targets, explicit or the kind's default.
    pub fn applies_to(&self) -> AppliesTo {
        if let Some(applies_to) = self.applies_to {
            return applies_to;
        }
        match &self.kind {
            CheckKind::NotBlank
            | CheckKind::Length { .. }
            | CheckKind::MinLength(_)
            | CheckKind::MaxLength(_)
            | CheckKind::Range { .. }
            | CheckKind::Min(_)
            | CheckKind::Max(_)
            | CheckKind::Pattern { .. }
            | CheckKind::Email
            | CheckKind::Url
            | CheckKind::MemberOf { .. }
            | CheckKind::NotMemberOf { .. }
            | CheckKind::AssertValid => AppliesTo::VALUES,
            CheckKind::Custom(predicate) => predicate.default_applies_to(),
            _ => AppliesTo::CONTAINER,
        }
    }

    pub fn when(&self) -> Option<&When> {
        self.when.as_ref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Returns true for checks that delegate to other checks.
    pub fn is_composite(&self) -> bool {
        matches!(
            self.kind,
            CheckKind::AssertValid
                | CheckKind::AssertConstraintSet { .. }
                | CheckKind::AssertFieldConstraints { .. }
        )
    }

    /// Kind specific `{placeholder}` values for the message template.
    pub fn message_variables(&self) -> Vec<(String, String)> {
        fn var(name: &str, value: impl ToString) -> (String, String) {
            (name.to_string(), value.to_string())
        }
        match &self.kind {
            CheckKind::Length { min, max } | CheckKind::Size { min, max } => {
                vec![var("min", min), var("max", max)]
            }
            CheckKind::MinLength(min) | CheckKind::MinSize(min) => vec![var("min", min)],
            CheckKind::MaxLength(max) | CheckKind::MaxSize(max) => vec![var("max", max)],
            CheckKind::Range { min, max } => vec![var("min", min), var("max", max)],
            CheckKind::Min(min) => vec![var("min", min)],
            CheckKind::Max(max) => vec![var("max", max)],
            CheckKind::Pattern { sources, .. } => vec![var("pattern", sources.join(", "))],
            CheckKind::MemberOf { values, .. } | CheckKind::NotMemberOf { values, .. } => {
                vec![var("members", values.join(", "))]
            }
            CheckKind::Expression {
                language,
                expression,
            } => vec![
                var("language", language),
                var("expression", format!("{language}:{expression}")),
            ],
            CheckKind::Custom(predicate) => predicate.message_variables(),
            CheckKind::AssertConstraintSet { id } => vec![var("id", id)],
            CheckKind::AssertFieldConstraints { field, .. } => {
                field.iter().map(|f| var("field", f)).collect()
            }
            _ => Vec::new(),
        }
    }
}
