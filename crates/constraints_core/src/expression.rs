//! Expression language collaborator.
//!
//! Script-based checks and activation conditions are evaluated by an
//! [`ExpressionLanguage`] registered under a language id. The engine only
//! needs a boolean answer for an expression and a set of bindings.

use crate::error::{ConfigError, EvaluationError};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Variables visible to an expression.
pub type Bindings = HashMap<String, Value>;

/// Binding name of the object owning the validated member.
pub const BINDING_THIS: &str = "_this";

/// Binding name of the validated value.
pub const BINDING_VALUE: &str = "_value";

/// A pluggable expression evaluator.
pub trait ExpressionLanguage: Send + Sync {
    /// Evaluates `expression` and interprets the result as a boolean.
    fn evaluate_as_boolean(
        &self,
        expression: &str,
        bindings: &Bindings,
    ) -> Result<bool, EvaluationError>;
}

/// Adapts a closure into an [`ExpressionLanguage`].
///
/// # Example
///
/// ```rust
/// use constraints_core::{Bindings, ExpressionLanguage, FnExpressionLanguage, Value};
///
/// let lang = FnExpressionLanguage::new(|expr: &str, bindings: &Bindings| {
///     Ok(expr == "not_null" && !bindings["_value"].is_null())
/// });
/// let mut bindings = Bindings::new();
/// bindings.insert("_value".to_string(), Value::from("x"));
/// assert!(lang.evaluate_as_boolean("not_null", &bindings).unwrap());
/// ```
pub struct FnExpressionLanguage<F> {
    f: F,
}

impl<F> FnExpressionLanguage<F>
where
    F: Fn(&str, &Bindings) -> Result<bool, EvaluationError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ExpressionLanguage for FnExpressionLanguage<F>
where
    F: Fn(&str, &Bindings) -> Result<bool, EvaluationError> + Send + Sync,
{
    fn evaluate_as_boolean(
        &self,
        expression: &str,
        bindings: &Bindings,
    ) -> Result<bool, EvaluationError> {
        (self.f)(expression, bindings)
    }
}

/// Activation condition of a check, written `language:expression`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct When {
    pub language: String,
    pub expression: String,
}

impl When {
    pub fn new(language: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            expression: expression.into(),
        }
    }
}

impl FromStr for When {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((language, expression))
                if !language.trim().is_empty() && !expression.trim().is_empty() =>
            {
                Ok(Self::new(language.trim(), expression.trim()))
            }
            _ => Err(ConfigError::InvalidWhen(s.to_string())),
        }
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.language, self.expression)
    }
}
