//! Violation message rendering.
//!
//! A check's message is a template such as `"{context} cannot be null"`.
//! The [`MessageResolver`] may first swap the template for another one
//! (localized text, project wording); [`render`] then substitutes the
//! `{placeholder}`s.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid"));

/// Maps a message template or key to the template actually rendered.
pub trait MessageResolver: Send + Sync {
    /// Returns the replacement for `key`, or `None` to keep it.
    fn resolve(&self, key: &str) -> Option<String>;
}

/// Resolver keeping every template unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMessageResolver;

impl MessageResolver for DefaultMessageResolver {
    fn resolve(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Resolver backed by a fixed table, keyed by template or error code.
///
/// # Example
///
/// ```rust
/// use constraints_validator::{MessageResolver, TableMessageResolver};
///
/// let resolver = TableMessageResolver::new()
///     .with_message("constraints.NotNull", "{context} is required");
/// assert_eq!(
///     resolver.resolve("constraints.NotNull").as_deref(),
///     Some("{context} is required")
/// );
/// ```
#[derive(Debug, Default, Clone)]
pub struct TableMessageResolver {
    messages: HashMap<String, String>,
}

impl TableMessageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.messages.insert(key.into(), template.into());
        self
    }
}

impl MessageResolver for TableMessageResolver {
    fn resolve(&self, key: &str) -> Option<String> {
        self.messages.get(key).cloned()
    }
}

/// Substitutes `{name}` placeholders; unknown placeholders are kept verbatim.
pub fn render(template: &str, variables: &[(String, String)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            variables
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
