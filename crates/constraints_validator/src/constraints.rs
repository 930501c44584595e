//! Predicate evaluation of the built-in check kinds.
//!
//! Every kind except `NotNull`, `Null`, `Expression` and custom predicates
//! treats `Null` as satisfied; nullability is a concern of its own check.
//! Composite kinds are dispatched by the engine and never reach this
//! module's predicate.

use crate::error::{Result, ValidationError};
use crate::expression::ExpressionLanguages;
use chrono::{DateTime, Utc};
use constraints_core::{Check, CheckKind, Context, ObjectRef, Value};
use std::borrow::Cow;
use validator::{ValidateEmail, ValidateUrl};

/// Evaluates `check` against `value`.
///
/// Returns `Ok(false)` for a violated check; errors mean the check could
/// not be evaluated at all.
pub fn is_satisfied(
    check: &Check,
    validated_object: Option<&ObjectRef>,
    value: &Value,
    context: &Context,
    languages: &ExpressionLanguages,
) -> Result<bool> {
    match check.kind() {
        CheckKind::NotNull => return Ok(!value.is_null()),
        CheckKind::Null => return Ok(value.is_null()),
        CheckKind::Expression {
            language,
            expression,
        } => {
            return languages.evaluate(
                check.name(),
                language,
                expression,
                validated_object,
                value,
            );
        }
        CheckKind::Custom(predicate) => {
            return predicate
                .is_satisfied(validated_object, value, context)
                .map_err(|e| ValidationError::evaluation(check.name(), e));
        }
        _ => {}
    }

    if value.is_null() {
        return Ok(true);
    }

    let satisfied = match check.kind() {
        CheckKind::NotEmpty => match value.container_len() {
            Some(len) => len > 0,
            None => !string_form(value).is_empty(),
        },
        CheckKind::NotBlank => !string_form(value).trim().is_empty(),
        CheckKind::Length { min, max } => in_bounds(char_count(value), Some(*min), Some(*max)),
        CheckKind::MinLength(min) => in_bounds(char_count(value), Some(*min), None),
        CheckKind::MaxLength(max) => in_bounds(char_count(value), None, Some(*max)),
        CheckKind::Size { min, max } => value
            .container_len()
            .is_some_and(|len| in_bounds(len, Some(*min), Some(*max))),
        CheckKind::MinSize(min) => value
            .container_len()
            .is_some_and(|len| in_bounds(len, Some(*min), None)),
        CheckKind::MaxSize(max) => value
            .container_len()
            .is_some_and(|len| in_bounds(len, None, Some(*max))),
        CheckKind::Range { min, max } => {
            numeric(value).is_some_and(|n| n >= *min && n <= *max)
        }
        CheckKind::Min(min) => numeric(value).is_some_and(|n| n >= *min),
        CheckKind::Max(max) => numeric(value).is_some_and(|n| n <= *max),
        CheckKind::Pattern {
            patterns,
            match_all,
            ..
        } => {
            let text = string_form(value);
            if *match_all {
                patterns.iter().all(|p| p.is_match(&text))
            } else {
                patterns.iter().any(|p| p.is_match(&text))
            }
        }
        CheckKind::Email => {
            let text: &str = &string_form(value);
            text.validate_email()
        }
        CheckKind::Url => {
            let text: &str = &string_form(value);
            text.validate_url()
        }
        CheckKind::Past => datetime(value).is_some_and(|dt| dt < Utc::now()),
        CheckKind::Future => datetime(value).is_some_and(|dt| dt > Utc::now()),
        CheckKind::AssertTrue => value.as_bool() == Some(true),
        CheckKind::AssertFalse => value.as_bool() == Some(false),
        CheckKind::MemberOf {
            values,
            ignore_case,
        } => is_member(value, values, *ignore_case),
        CheckKind::NotMemberOf {
            values,
            ignore_case,
        } => !is_member(value, values, *ignore_case),
        // dispatched by the engine
        CheckKind::AssertValid
        | CheckKind::AssertConstraintSet { .. }
        | CheckKind::AssertFieldConstraints { .. } => true,
        CheckKind::NotNull
        | CheckKind::Null
        | CheckKind::Expression { .. }
        | CheckKind::Custom(_) => true,
    };
    Ok(satisfied)
}

/// Evaluates the activation condition of `check`; checks without one are
/// always active.
pub fn is_active(
    check: &Check,
    validated_object: Option<&ObjectRef>,
    value: &Value,
    languages: &ExpressionLanguages,
) -> Result<bool> {
    match check.when() {
        Some(when) => languages.evaluate(
            check.name(),
            &when.language,
            &when.expression,
            validated_object,
            value,
        ),
        None => Ok(true),
    }
}

/// Text a scalar is checked as.
fn string_form(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

fn char_count(value: &Value) -> usize {
    string_form(value).chars().count()
}

fn in_bounds(n: usize, min: Option<usize>, max: Option<usize>) -> bool {
    min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(_) | Value::Float(_) => value.as_float(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

fn is_member(value: &Value, values: &[String], ignore_case: bool) -> bool {
    let text = string_form(value);
    if ignore_case {
        let text = text.to_lowercase();
        values.iter().any(|v| v.to_lowercase() == text)
    } else {
        values.iter().any(|v| *v == text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use constraints_core::{CheckPredicate, EvaluationError};

    fn check(check: &Check, value: impl Into<Value>) -> bool {
        let languages = ExpressionLanguages::new();
        is_satisfied(
            check,
            None,
            &value.into(),
            &Context::field("Person", "x"),
            &languages,
        )
        .unwrap()
    }

    #[test]
    fn test_null_checks() {
        assert!(!check(&Check::not_null(), Value::Null));
        assert!(check(&Check::not_null(), "x"));
        assert!(check(&Check::null(), Value::Null));
        assert!(!check(&Check::null(), 1));
        // everything else accepts null
        assert!(check(&Check::max_length(0), Value::Null));
        assert!(check(&Check::size(1, 2), Value::Null));
        assert!(check(&Check::email(), Value::Null));
    }

    #[test]
    fn test_string_checks() {
        assert!(!check(&Check::not_empty(), ""));
        assert!(check(&Check::not_empty(), " "));
        assert!(!check(&Check::not_blank(), "  \t"));
        assert!(check(&Check::length(2, 4), "abc"));
        assert!(!check(&Check::length(2, 4), "abcde"));
        assert!(check(&Check::max_length(3), "äöü"));
        assert!(!check(&Check::min_length(3), "ab"));
    }

    #[test]
    fn test_container_checks() {
        assert!(!check(&Check::not_empty(), Value::list(Vec::<Value>::new())));
        assert!(check(&Check::size(1, 2), Value::list([1, 2])));
        assert!(!check(&Check::max_size(1), Value::map([("a", 1), ("b", 2)])));
        assert!(check(&Check::min_size(3), Value::array([1, 2, 3])));
        // a scalar has no size
        assert!(!check(&Check::size(0, 10), "abc"));
    }

    #[test]
    fn test_numeric_checks() {
        assert!(check(&Check::range(1.0, 10.0), 5));
        assert!(check(&Check::range(1.0, 10.0), 10.0));
        assert!(!check(&Check::range(1.0, 10.0), 11));
        assert!(check(&Check::min(0.0), "3.5"));
        assert!(!check(&Check::max(0.0), "abc"));
    }

    #[test]
    fn test_pattern_email_url() {
        let digits = Check::pattern("[0-9]+").unwrap();
        assert!(check(&digits, "123"));
        // full match only
        assert!(!check(&digits, "12a"));

        let any = Check::patterns(["a+", "b+"], false).unwrap();
        assert!(check(&any, "bbb"));
        let all = Check::patterns(["a.*", ".*z"], true).unwrap();
        assert!(check(&all, "abcz"));
        assert!(!check(&all, "abc"));

        assert!(check(&Check::email(), "alice@example.com"));
        assert!(!check(&Check::email(), "not-an-email"));
        assert!(check(&Check::url(), "https://example.com/path"));
        assert!(!check(&Check::url(), "no url"));
    }

    #[test]
    fn test_temporal_checks() {
        let past = Utc::now() - Duration::days(1);
        let future = Utc::now() + Duration::days(1);
        assert!(check(&Check::past(), past));
        assert!(!check(&Check::past(), future));
        assert!(check(&Check::future(), future.to_rfc3339()));
        assert!(!check(&Check::future(), "garbage"));
    }

    #[test]
    fn test_boolean_and_membership() {
        assert!(check(&Check::assert_true(), true));
        assert!(!check(&Check::assert_true(), false));
        assert!(check(&Check::assert_false(), false));
        assert!(check(&Check::member_of(["red", "green"], false), "red"));
        assert!(!check(&Check::member_of(["red", "green"], false), "RED"));
        assert!(check(&Check::member_of(["red", "green"], true), "RED"));
        assert!(check(&Check::not_member_of(["admin"], true), "user"));
        assert!(!check(&Check::not_member_of(["admin"], true), "Admin"));
    }

    #[test]
    fn test_is_active() {
        use constraints_core::{Bindings, FnExpressionLanguage};
        use std::sync::Arc;

        let languages = ExpressionLanguages::new();
        languages.register(
            "test",
            Arc::new(FnExpressionLanguage::new(|expr: &str, bindings: &Bindings| {
                Ok(expr == "set" && !bindings["_value"].is_null())
            })),
        );
        let check = Check::not_null().with_when("test:set").unwrap();
        assert!(is_active(&check, None, &Value::from(1), &languages).unwrap());
        assert!(!is_active(&check, None, &Value::Null, &languages).unwrap());
        assert!(is_active(&Check::not_null(), None, &Value::Null, &languages).unwrap());

        let unknown = Check::not_null().with_when("other:set").unwrap();
        assert!(matches!(
            is_active(&unknown, None, &Value::Null, &languages),
            Err(ValidationError::ExpressionLanguageNotAvailable(_))
        ));
    }

    #[derive(Debug)]
    struct Even;

    impl CheckPredicate for Even {
        fn name(&self) -> &str {
            "Even"
        }

        fn is_satisfied(
            &self,
            _validated_object: Option<&ObjectRef>,
            value: &Value,
            _context: &Context,
        ) -> std::result::Result<bool, EvaluationError> {
            value
                .as_int()
                .map(|i| i % 2 == 0)
                .ok_or_else(|| EvaluationError::new("not an integer"))
        }
    }

    #[test]
    fn test_custom_predicate() {
        let even = Check::custom(Even);
        assert!(check(&even, 4));
        assert!(!check(&even, 3));

        let languages = ExpressionLanguages::new();
        let err = is_satisfied(
            &even,
            None,
            &Value::from("x"),
            &Context::field("Person", "x"),
            &languages,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::EvaluationFailed { check, .. } if check == "Even"));
    }
}
