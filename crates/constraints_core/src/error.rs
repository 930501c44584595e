//! Error types for the constraints core.
//!
//! This module defines the errors raised while building configuration
//! (`ConfigError`), while reading values out of the object model
//! (`AccessError`) and while evaluating a predicate or an expression
//! (`EvaluationError`).

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors in the declared configuration of checks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// An activation condition is not of the form `language:expression`
    #[error("Invalid activation condition '{0}': expected 'language:expression'")]
    InvalidWhen(String),

    /// A regular expression failed to compile
    #[error("Invalid regex pattern '{pattern}': {error}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        error: String,
    },

    /// Return value constraints were declared on a void method
    #[error("Cannot add return value constraints to void method '{class}.{method}'")]
    VoidMethod {
        /// Declaring class
        class: String,
        /// Method name
        method: String,
    },

    /// A referenced member does not exist on the class
    #[error("{member_kind} '{name}' not found on class '{class}'")]
    MemberNotFound {
        /// Class that was searched
        class: String,
        /// Kind of member ("Field", "Method", "Constructor")
        member_kind: &'static str,
        /// Member name or description
        name: String,
    },

    /// A parameter index is outside the parameter list
    #[error("Parameter index {index} out of range for '{member}' with {count} parameter(s)")]
    ParameterIndexOutOfRange {
        /// Method or constructor description
        member: String,
        /// Requested index
        index: usize,
        /// Number of declared parameters
        count: usize,
    },

    /// Any other inconsistency in the configuration
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates a new member-not-found error.
    pub fn member_not_found(
        class: impl Into<String>,
        member_kind: &'static str,
        name: impl Into<String>,
    ) -> Self {
        Self::MemberNotFound {
            class: class.into(),
            member_kind,
            name: name.into(),
        }
    }

    /// Creates a new generic configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Errors raised while reading fields or invoking methods on the object model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    /// The class hierarchy declares no such field
    #[error("No field '{field}' on class '{class}'")]
    NoSuchField { class: String, field: String },

    /// The class hierarchy declares no such method
    #[error("No method '{method}' with {arity} parameter(s) on class '{class}'")]
    NoSuchMethod {
        class: String,
        method: String,
        arity: usize,
    },

    /// The method is declared but has no invoker attached
    #[error("Method '{class}.{method}' has no invoker")]
    NotInvocable { class: String, method: String },

    /// The invoker itself failed
    #[error("Invocation of '{class}.{method}' failed: {message}")]
    InvocationFailed {
        class: String,
        method: String,
        message: String,
    },
}

impl AccessError {
    /// Creates a new invocation failure, typically from inside an invoker.
    pub fn invocation(
        class: impl Into<String>,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvocationFailed {
            class: class.into(),
            method: method.into(),
            message: message.into(),
        }
    }
}

/// A predicate or expression could not be evaluated to a boolean.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct EvaluationError {
    /// Failure details
    pub message: String,
}

impl EvaluationError {
    /// Creates a new evaluation error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
