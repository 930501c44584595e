//! Registry of expression languages.

use crate::error::{Result, ValidationError};
use constraints_core::{BINDING_THIS, BINDING_VALUE, Bindings, ExpressionLanguage, ObjectRef, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Expression languages by language id.
#[derive(Default)]
pub struct ExpressionLanguages {
    languages: RwLock<HashMap<String, Arc<dyn ExpressionLanguage>>>,
}

impl ExpressionLanguages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `language` under `id`, replacing any previous one.
    pub fn register(&self, id: impl Into<String>, language: Arc<dyn ExpressionLanguage>) {
        let id = id.into();
        debug!("Registering expression language '{}'", id);
        self.languages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, language);
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.languages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn ExpressionLanguage>> {
        self.languages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| ValidationError::ExpressionLanguageNotAvailable(id.to_string()))
    }

    /// Evaluates `expression` with `_this` and `_value` bound.
    pub fn evaluate(
        &self,
        check: &str,
        language: &str,
        expression: &str,
        validated_object: Option<&ObjectRef>,
        value: &Value,
    ) -> Result<bool> {
        let language = self.get(language)?;
        let bindings = bindings(validated_object, value);
        language
            .evaluate_as_boolean(expression, &bindings)
            .map_err(|e| ValidationError::evaluation(check, e))
    }
}

impl std::fmt::Debug for ExpressionLanguages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let languages = self.languages.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_set().entries(languages.keys()).finish()
    }
}

fn bindings(validated_object: Option<&ObjectRef>, value: &Value) -> Bindings {
    let mut bindings = Bindings::new();
    bindings.insert(
        BINDING_THIS.to_string(),
        validated_object.map(Value::from).unwrap_or(Value::Null),
    );
    bindings.insert(BINDING_VALUE.to_string(), value.clone());
    bindings
}
