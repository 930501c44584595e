//! Engine configuration.

use crate::message::{DefaultMessageResolver, MessageResolver};
use constraints_core::{Configurer, ExpressionLanguage};
use std::sync::Arc;

/// Everything a [`Validator`](crate::Validator) is built from.
///
/// # Example
///
/// ```rust
/// use constraints_core::ProgrammaticConfigurer;
/// use constraints_validator::{Validator, ValidatorConfig};
///
/// let config = ValidatorConfig::new()
///     .configurer(ProgrammaticConfigurer::new())
///     .all_profiles_enabled(false);
/// let validator = Validator::with_config(config);
/// assert!(!validator.is_profile_enabled("default"));
/// ```
#[derive(Clone)]
pub struct ValidatorConfig {
    pub(crate) configurers: Vec<Arc<dyn Configurer>>,
    pub(crate) expression_languages: Vec<(String, Arc<dyn ExpressionLanguage>)>,
    pub(crate) message_resolver: Arc<dyn MessageResolver>,
    pub(crate) all_profiles_enabled: bool,
}

impl ValidatorConfig {
    /// Creates a configuration without configurers or expression languages.
    pub fn new() -> Self {
        Self {
            configurers: Vec::new(),
            expression_languages: Vec::new(),
            message_resolver: Arc::new(DefaultMessageResolver),
            all_profiles_enabled: true,
        }
    }

    /// Appends a configurer; configurers are consulted in insertion order.
    pub fn configurer(self, configurer: impl Configurer + 'static) -> Self {
        self.shared_configurer(Arc::new(configurer))
    }

    /// Appends a configurer shared with other owners.
    pub fn shared_configurer(mut self, configurer: Arc<dyn Configurer>) -> Self {
        self.configurers.push(configurer);
        self
    }

    /// Registers an expression language under `id`.
    pub fn expression_language(
        mut self,
        id: impl Into<String>,
        language: impl ExpressionLanguage + 'static,
    ) -> Self {
        self.expression_languages
            .push((id.into(), Arc::new(language)));
        self
    }

    pub fn message_resolver(mut self, resolver: impl MessageResolver + 'static) -> Self {
        self.message_resolver = Arc::new(resolver);
        self
    }

    /// Initial profile mode: every profile enabled (the default) or none.
    pub fn all_profiles_enabled(mut self, enabled: bool) -> Self {
        self.all_profiles_enabled = enabled;
        self
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("configurers", &self.configurers.len())
            .field(
                "expression_languages",
                &self
                    .expression_languages
                    .iter()
                    .map(|(id, _)| id.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("all_profiles_enabled", &self.all_profiles_enabled)
            .finish_non_exhaustive()
    }
}
