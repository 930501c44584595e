//! Violation reports.

use crate::check::Check;
use crate::context::Context;
use crate::object::ObjectRef;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// One failed check against one value.
#[derive(Debug, Clone)]
pub struct Violation {
    /// The failing check
    pub check: Arc<Check>,
    pub check_name: String,
    /// Rendered message
    pub message: String,
    /// Template the message was rendered from
    pub message_template: String,
    pub error_code: String,
    pub severity: i32,
    pub profiles: Vec<String>,
    /// Object owning the validated member, if any
    pub validated_object: Option<ObjectRef>,
    /// The value that failed the check
    pub invalid_value: Value,
    pub context: Context,
    /// Violations of a cascaded object
    pub causes: Vec<Violation>,
}

impl Violation {
    /// Returns true if this violation nests the violations of a cascaded object.
    pub fn has_causes(&self) -> bool {
        !self.causes.is_empty()
    }

    /// Iterates this violation and all nested causes depth first.
    pub fn flatten(&self) -> Vec<&Violation> {
        let mut out = vec![self];
        for cause in &self.causes {
            out.extend(cause.flatten());
        }
        out
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
