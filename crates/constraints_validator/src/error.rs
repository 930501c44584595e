//! Error types for validation operations.

use constraints_core::{AccessError, ConfigError, EvaluationError, Violation};
use thiserror::Error;

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors that abort a validation call.
///
/// Failed checks are never errors; they are reported as [`Violation`]s.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A validation call failed; carries the underlying cause
    #[error("Validation of {target} failed: {source}")]
    ValidationFailed {
        target: String,
        #[source]
        source: Box<ValidationError>,
    },

    /// Broken check configuration
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Field read or method invocation failed
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A check references a constraint set nobody defines
    #[error("Constraint set '{0}' is not defined")]
    UndefinedConstraintSet(String),

    /// A constraint set with the same id is already registered
    #[error("Constraint set '{0}' is already defined")]
    ConstraintSetAlreadyDefined(String),

    /// The field of a field-constraints reference cannot be determined
    #[error("Cannot resolve field constraints of '{field}' in context {context}")]
    FieldNotResolved { field: String, context: String },

    /// No expression language registered under the id
    #[error("Expression language '{0}' is not available")]
    ExpressionLanguageNotAvailable(String),

    /// A predicate or expression could not be evaluated
    #[error("Evaluation of check '{check}' failed: {source}")]
    EvaluationFailed {
        check: String,
        #[source]
        source: EvaluationError,
    },

    /// A configurer failed to provide its configuration
    #[error("Configurer failed: {0:#}")]
    Configurer(anyhow::Error),

    /// API misuse, reported without wrapping
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Raised by `assert_valid` when violations exist
    #[error("{}", summary(.0))]
    ConstraintsViolated(Vec<Violation>),
}

fn summary(violations: &[Violation]) -> &str {
    violations
        .first()
        .map(|v| v.message.as_str())
        .unwrap_or("constraints violated")
}

impl ValidationError {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a new unresolved field error.
    pub fn field_not_resolved(field: impl Into<String>, context: impl ToString) -> Self {
        Self::FieldNotResolved {
            field: field.into(),
            context: context.to_string(),
        }
    }

    /// Creates a new evaluation failure.
    pub fn evaluation(check: impl Into<String>, source: EvaluationError) -> Self {
        Self::EvaluationFailed {
            check: check.into(),
            source,
        }
    }

    /// Wraps a fatal error raised while validating `target`.
    ///
    /// Argument misuse and errors that are already wrapped pass through.
    pub fn wrap(self, target: impl ToString) -> Self {
        match self {
            Self::InvalidArgument(_) | Self::ValidationFailed { .. } => self,
            other => Self::ValidationFailed {
                target: target.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the error at the bottom of a `ValidationFailed` chain.
    pub fn root_cause(&self) -> &ValidationError {
        match self {
            Self::ValidationFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Violations carried by `ConstraintsViolated`.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::ConstraintsViolated(violations) => violations,
            _ => &[],
        }
    }
}

/// Converts registry misuse into the error surfaced at the API boundary.
///
/// Out-of-range parameter indices are argument errors; everything else is
/// a configuration error.
pub(crate) fn registry_error(error: ConfigError) -> ValidationError {
    match error {
        ConfigError::ParameterIndexOutOfRange { .. } => {
            ValidationError::InvalidArgument(error.to_string())
        }
        other => ValidationError::Configuration(other),
    }
}
