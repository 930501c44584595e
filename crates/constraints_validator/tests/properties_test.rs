//! Behavioral properties of the validation engine.

use constraints_core::{
    Bindings, Check, ClassBuilder, ClassConfigBuilder, ClassRef, ConfigError, ConstraintTarget,
    Context, EvaluationError, FnExpressionLanguage, Object, ObjectRef, ProgrammaticConfigurer,
    Value, ValueKind, Violation,
};
use constraints_validator::{
    ConstraintSet, TableMessageResolver, ValidationError, Validator, ValidatorConfig,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Routes engine logs to the test output; `RUST_LOG` selects the level.
fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_test_writer()
                .with_target(false)
                .compact(),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn summary(violations: &[Violation]) -> Vec<(String, String)> {
    violations
        .iter()
        .map(|v| (v.check_name.clone(), v.message.clone()))
        .collect()
}

fn node_class() -> ClassRef {
    ClassBuilder::new("Node")
        .field("label", ValueKind::String)
        .field("next", ValueKind::Object("Node".into()))
        .build()
}

fn node_validator() -> Validator {
    let validator = Validator::new();
    let node = node_class();
    validator
        .add_field_checks(&node, "label", [Check::not_blank()])
        .unwrap();
    validator
        .add_field_checks(&node, "next", [Check::assert_valid()])
        .unwrap();
    validator
}

#[test]
fn test_validation_is_idempotent() {
    let node = node_class();
    let validator = node_validator();
    let head = Object::with_values(&node, [("label", " ")]).unwrap();
    let tail = Object::with_values(&node, [("label", "")]).unwrap();
    head.set("next", &tail).unwrap();

    let first = validator.validate(&head).unwrap();
    let second = validator.validate(&head).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(summary(&first), summary(&second));
}

#[test]
fn test_self_reference_terminates_without_violation() {
    let node = node_class();
    let validator = node_validator();
    let lonely = Object::with_values(&node, [("label", "me")]).unwrap();
    lonely.set("next", &lonely).unwrap();

    assert!(validator.validate(&lonely).unwrap().is_empty());
}

#[test]
fn test_long_cycle_is_walked_once() {
    init_logging();
    let node = node_class();
    let validator = node_validator();
    let nodes: Vec<ObjectRef> = (0..4)
        .map(|i| Object::with_values(&node, [("label", if i == 2 { "" } else { "n" })]).unwrap())
        .collect();
    for (i, n) in nodes.iter().enumerate() {
        n.set("next", &nodes[(i + 1) % nodes.len()]).unwrap();
    }

    let violations = validator.validate(&nodes[0]).unwrap();
    // nodes[0] -> nodes[1] -> nodes[2] (blank label)
    assert_eq!(violations.len(), 1);
    let mut depth = 0;
    let mut current = &violations[0];
    while let Some(cause) = current.causes.first() {
        depth += 1;
        current = cause;
    }
    assert_eq!(depth, 2);
    assert_eq!(current.check_name, "NotBlank");
    assert_eq!(violations[0].flatten().len(), 3);
}

#[test]
fn test_shared_object_is_cascaded_into_once() {
    let vertex = ClassBuilder::new("Vertex")
        .field("label", ValueKind::String)
        .field("left", ValueKind::Object("Vertex".into()))
        .field("right", ValueKind::Object("Vertex".into()))
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(&vertex, "label", [Check::not_null()])
        .unwrap();
    for field in ["left", "right"] {
        validator
            .add_field_checks(&vertex, field, [Check::assert_valid()])
            .unwrap();
    }
    let a = Object::with_values(&vertex, [("label", "a")]).unwrap();
    let b = Object::with_values(&vertex, [("label", "b")]).unwrap();
    let c = Object::with_values(&vertex, [("label", "c")]).unwrap();
    let d = Object::new(&vertex);
    a.set("left", &b).unwrap();
    a.set("right", &c).unwrap();
    b.set("left", &d).unwrap();
    c.set("left", &d).unwrap();

    let violations = validator.validate(&a).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].context, Context::field("Vertex", "left"));
    let not_null: Vec<_> = violations[0]
        .flatten()
        .into_iter()
        .filter(|v| v.check_name == "NotNull")
        .collect();
    assert_eq!(not_null.len(), 1);
    assert_eq!(violations[0].flatten().len(), 3);
}

#[test]
fn test_objects_built_by_getters_are_each_validated() {
    let child = ClassBuilder::new("Child")
        .field("name", ValueKind::String)
        .build();
    let (named, unnamed) = (child.clone(), child.clone());
    let parent = ClassBuilder::new("Parent")
        .getter("getA", ValueKind::Object("Child".into()), move |_| {
            let built = Object::with_values(&named, [("name", "a")])?;
            Ok(Value::from(&built))
        })
        .getter("getB", ValueKind::Object("Child".into()), move |_| {
            Ok(Value::from(&Object::new(&unnamed)))
        })
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(&child, "name", [Check::not_null()])
        .unwrap();
    for getter in ["getA", "getB"] {
        validator
            .add_method_return_value_checks(&parent, getter, 0, true, [Check::assert_valid()])
            .unwrap();
    }

    let obj = Object::new(&parent);
    for _ in 0..16 {
        let violations = validator.validate(&obj).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].context,
            Context::method_return_value("Parent", "getB")
        );
        assert_eq!(violations[0].causes[0].check_name, "NotNull");
    }
}

#[test]
fn test_container_targeting() {
    let bag = ClassBuilder::new("Bag")
        .field("items", ValueKind::Collection)
        .field("index", ValueKind::Map)
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(
            &bag,
            "items",
            [
                Check::pattern("[a-z]+").unwrap(),
                Check::max_size(2),
                Check::max_length(3).with_applies_to([ConstraintTarget::Container]),
            ],
        )
        .unwrap();
    validator
        .add_field_checks(
            &bag,
            "index",
            [Check::min_length(2).with_applies_to([ConstraintTarget::Keys, ConstraintTarget::Values])],
        )
        .unwrap();

    let obj = Object::with_values(&bag, [("items", Value::list(["ok", "NO", "x1", "fine"]))])
        .unwrap();
    obj.set("index", Value::map([("a", "long"), ("bb", "c")]))
        .unwrap();

    let violations = validator.validate(&obj).unwrap();
    let found: Vec<(String, String)> = violations
        .iter()
        .map(|v| (v.check_name.clone(), v.context.to_string()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("Pattern".to_string(), "Bag.items[1]".to_string()),
            ("Pattern".to_string(), "Bag.items[2]".to_string()),
            ("MaxSize".to_string(), "Bag.items".to_string()),
            ("MaxLength".to_string(), "Bag.items".to_string()),
            ("MinLength".to_string(), "Bag.index.keys[0]".to_string()),
            ("MinLength".to_string(), "Bag.index[bb]".to_string()),
        ]
    );
}

#[test]
fn test_null_member_declared_as_container() {
    let bag = ClassBuilder::new("Bag")
        .field("items", ValueKind::Collection)
        .field("index", ValueKind::Map)
        .field("extra", ValueKind::Any)
        .build();
    let validator = Validator::new();
    let values_only = || Check::not_null().with_applies_to([ConstraintTarget::Values]);
    validator
        .add_field_checks(&bag, "items", [values_only()])
        .unwrap();
    validator
        .add_field_checks(
            &bag,
            "index",
            [Check::not_null().with_applies_to([ConstraintTarget::Values, ConstraintTarget::Container])],
        )
        .unwrap();
    validator
        .add_field_checks(&bag, "extra", [values_only()])
        .unwrap();

    let violations = validator.validate(&Object::new(&bag)).unwrap();
    let contexts: Vec<String> = violations.iter().map(|v| v.context.to_string()).collect();
    assert_eq!(contexts, vec!["Bag.index", "Bag.extra"]);
}

#[test]
fn test_nested_containers_are_descended() {
    let grid = ClassBuilder::new("Grid")
        .field("rows", ValueKind::Array)
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(&grid, "rows", [Check::range(0.0, 9.0)])
        .unwrap();
    let rows = Value::array([Value::list([1, 2]), Value::list([3, 42])]);
    let obj = Object::with_values(&grid, [("rows", rows)]).unwrap();

    let violations = validator.validate(&obj).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].context.to_string(), "Grid.rows[1][1]");
    assert_eq!(violations[0].invalid_value, Value::from(42));
}

#[test]
fn test_profile_filtering() {
    let person = ClassBuilder::new("Person")
        .field("name", ValueKind::String)
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(&person, "name", [Check::not_null().with_profiles(["p1"])])
        .unwrap();
    let nobody = Object::new(&person);

    assert!(validator.validate_with_profiles(&nobody, &["p2"]).unwrap().is_empty());
    assert_eq!(validator.validate_with_profiles(&nobody, &["p1"]).unwrap().len(), 1);
    assert_eq!(validator.validate(&nobody).unwrap().len(), 1);

    validator.disable_profile("p1");
    assert!(validator.validate(&nobody).unwrap().is_empty());
    // an explicit list ignores the global settings
    assert_eq!(validator.validate_with_profiles(&nobody, &["p1"]).unwrap().len(), 1);

    validator.enable_all_profiles();
    assert_eq!(validator.validate(&nobody).unwrap().len(), 1);
}

#[test]
fn test_constraint_set_is_union_of_its_checks() {
    let checks = || {
        [
            Check::not_blank(),
            Check::max_length(4),
            Check::member_of(["root", "admin"], false),
        ]
    };
    let direct = ClassBuilder::new("Login")
        .field("user", ValueKind::String)
        .build();
    let validator = Validator::new();
    validator
        .add_constraint_set(ConstraintSet::new("user", checks()), false)
        .unwrap();
    validator.add_field_checks(&direct, "user", checks()).unwrap();

    let referenced = ClassBuilder::new("Login")
        .field("user", ValueKind::String)
        .build();
    let by_reference = Validator::new();
    by_reference
        .add_constraint_set(ConstraintSet::new("user", checks()), false)
        .unwrap();
    by_reference
        .add_field_checks(&referenced, "user", [Check::assert_constraint_set("user")])
        .unwrap();

    for user in ["root", "  ", "operator", "x"] {
        let a = Object::with_values(&direct, [("user", user)]).unwrap();
        let b = Object::with_values(&referenced, [("user", user)]).unwrap();
        assert_eq!(
            summary(&validator.validate(&a).unwrap()),
            summary(&by_reference.validate(&b).unwrap()),
            "user {user:?}"
        );
    }
}

#[test]
fn test_undefined_constraint_set_is_fatal() {
    let login = ClassBuilder::new("Login")
        .field("user", ValueKind::String)
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(&login, "user", [Check::assert_constraint_set("missing")])
        .unwrap();

    let err = validator.validate(&Object::new(&login)).unwrap_err();
    assert!(matches!(err, ValidationError::ValidationFailed { .. }));
    assert!(matches!(
        err.root_cause(),
        ValidationError::UndefinedConstraintSet(id) if id == "missing"
    ));
}

#[test]
fn test_static_members_are_validated_per_class() {
    let base = ClassBuilder::new("Base")
        .static_field("registry", ValueKind::Map, Value::Null)
        .build();
    let derived = ClassBuilder::new("Derived")
        .extends(&base)
        .static_field("limit", ValueKind::Int, 100)
        .static_getter("getLimitLabel", ValueKind::String, |class| {
            Ok(Value::from(format!("{}", class.get_static("limit")?)))
        })
        .field("name", ValueKind::String)
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(&base, "registry", [Check::not_null()])
        .unwrap();
    validator
        .add_field_checks(&derived, "limit", [Check::max(10.0)])
        .unwrap();
    validator
        .add_method_return_value_checks(&derived, "getLimitLabel", 0, true, [Check::max_length(2)])
        .unwrap();

    let violations = validator.validate_static(&derived).unwrap();
    let contexts: Vec<String> = violations.iter().map(|v| v.context.to_string()).collect();
    // Base.registry is not inherited by the static walk
    assert_eq!(contexts, vec!["Derived.limit", "Derived.getLimitLabel()"]);

    assert_eq!(validator.validate_static(&base).unwrap().len(), 1);
    // instance validation ignores static members
    assert!(validator.validate(&Object::new(&derived)).unwrap().is_empty());
}

#[test]
fn test_concurrent_validation_during_reconfiguration() {
    init_logging();
    let person = ClassBuilder::new("Person")
        .field("name", ValueKind::String)
        .field("nickname", ValueKind::String)
        .build();
    let validator = Arc::new(Validator::new());
    validator
        .add_field_checks(&person, "name", [Check::not_null()])
        .unwrap();
    let nobody = Object::new(&person);

    thread::scope(|s| {
        for _ in 0..4 {
            let validator = validator.clone();
            let nobody = nobody.clone();
            s.spawn(move || {
                for _ in 0..200 {
                    let violations = validator.validate(&nobody).unwrap();
                    assert!(violations.iter().any(|v| v.context == Context::field("Person", "name")));
                }
            });
        }
        let validator = validator.clone();
        let person = person.clone();
        s.spawn(move || {
            for _ in 0..200 {
                let added = validator
                    .add_field_checks(&person, "nickname", [Check::not_null()])
                    .unwrap();
                validator
                    .remove_field_checks(&person, "nickname", &added)
                    .unwrap();
            }
        });
    });

    assert_eq!(validator.validate(&nobody).unwrap().len(), 1);
}

#[test]
fn test_when_condition_and_expression_checks() {
    let language = FnExpressionLanguage::new(|expr: &str, bindings: &Bindings| {
        let this = bindings
            .get("_this")
            .and_then(Value::as_object)
            .ok_or_else(|| EvaluationError::new("no _this"))?;
        match expr {
            "is_company" => Ok(this.get("kind").map_err(|e| EvaluationError::new(e.to_string()))?
                == Value::from("company")),
            "positive" => Ok(bindings["_value"].as_int().is_some_and(|i| i > 0)),
            other => Err(EvaluationError::new(format!("unknown expression {other}"))),
        }
    });
    let customer = ClassBuilder::new("Customer")
        .field("kind", ValueKind::String)
        .field("vatId", ValueKind::String)
        .field("credit", ValueKind::Int)
        .build();
    let validator = Validator::with_config(ValidatorConfig::new().expression_language("test", language));
    validator
        .add_field_checks(
            &customer,
            "vatId",
            [Check::not_null().with_when("test:is_company").unwrap()],
        )
        .unwrap();
    validator
        .add_field_checks(&customer, "credit", [Check::expression("test", "positive")])
        .unwrap();

    let person = Object::with_values(&customer, [("kind", "person")]).unwrap();
    person.set("credit", 5).unwrap();
    assert!(validator.validate(&person).unwrap().is_empty());

    let company = Object::with_values(&customer, [("kind", "company")]).unwrap();
    company.set("credit", -1).unwrap();
    let names: Vec<String> = validator
        .validate(&company)
        .unwrap()
        .into_iter()
        .map(|v| v.check_name)
        .collect();
    assert_eq!(names, vec!["NotNull", "Expression"]);

    validator.remove_expression_language("test");
    let err = validator.validate(&company).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        ValidationError::ExpressionLanguageNotAvailable(id) if id == "test"
    ));
}

#[test]
fn test_malformed_condition_is_a_configuration_error() {
    assert!(matches!(
        Check::not_null().with_when("no language"),
        Err(ConfigError::InvalidWhen(_))
    ));
}

#[test]
fn test_assert_valid_raises_aggregate() {
    let person = ClassBuilder::new("Person")
        .field("name", ValueKind::String)
        .field("email", ValueKind::String)
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(&person, "name", [Check::not_null()])
        .unwrap();
    validator
        .add_field_checks(&person, "email", [Check::not_null()])
        .unwrap();

    let err = validator.assert_valid(&Object::new(&person)).unwrap_err();
    assert_eq!(err.violations().len(), 2);
    assert_eq!(err.to_string(), "Person.name cannot be null");

    let ok = Object::with_values(&person, [("name", "a"), ("email", "a@b.c")]).unwrap();
    validator.assert_valid(&ok).unwrap();
}

#[test]
fn test_accessor_failure_is_fatal() {
    let broken = ClassBuilder::new("Broken")
        .getter("getValue", ValueKind::Int, |_| {
            Err(constraints_core::AccessError::invocation("Broken", "getValue", "boom"))
        })
        .build();
    let validator = Validator::new();
    validator
        .add_method_return_value_checks(&broken, "getValue", 0, true, [Check::not_null()])
        .unwrap();

    let err = validator.validate(&Object::new(&broken)).unwrap_err();
    assert!(matches!(err, ValidationError::ValidationFailed { .. }));
    assert!(matches!(err.root_cause(), ValidationError::Access(_)));
}

#[test]
fn test_argument_misuse_is_not_wrapped() {
    let person = ClassBuilder::new("Person")
        .field("name", ValueKind::String)
        .method(
            "rename",
            vec![constraints_core::ParamInfo::new("name", ValueKind::String)],
            Some(ValueKind::Bool),
            |_, _| Ok(Value::from(true)),
        )
        .method("reset", Vec::new(), None, |_, _| Ok(Value::Null))
        .build();
    let validator = Validator::new();
    let obj = Object::new(&person);

    assert!(matches!(
        validator.validate_field_value(&obj, "age", &Value::from(3)),
        Err(ValidationError::InvalidArgument(_))
    ));
    assert!(matches!(
        validator.add_method_parameter_checks(&person, "rename", 1, 4, [Check::not_null()]),
        Err(ValidationError::InvalidArgument(_))
    ));
    assert!(matches!(
        validator.validate_constructor_parameters(&person, 0, &[]),
        Err(ValidationError::InvalidArgument(_))
    ));
    assert!(matches!(
        validator.add_method_return_value_checks(&person, "reset", 0, false, [Check::not_null()]),
        Err(ValidationError::Configuration(ConfigError::VoidMethod { .. }))
    ));
}

#[test]
fn test_field_value_is_validated_before_assignment() {
    let person = ClassBuilder::new("Person")
        .field("age", ValueKind::Int)
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(&person, "age", [Check::range(0.0, 150.0)])
        .unwrap();
    let obj = Object::with_values(&person, [("age", 30)]).unwrap();

    let violations = validator
        .validate_field_value(&obj, "age", &Value::from(200))
        .unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].invalid_value, Value::from(200));
    assert!(validator
        .validate_field_value(&obj, "age", &Value::from(20))
        .unwrap()
        .is_empty());
    // the field itself is untouched
    assert_eq!(obj.get("age").unwrap(), Value::from(30));
}

#[test]
fn test_method_return_value() {
    let calc = ClassBuilder::new("Calculator")
        .method(
            "divide",
            vec![
                constraints_core::ParamInfo::new("a", ValueKind::Int),
                constraints_core::ParamInfo::new("b", ValueKind::Int),
            ],
            Some(ValueKind::Int),
            |_, args| Ok(args[0].clone()),
        )
        .build();
    let validator = Validator::new();
    validator
        .add_method_return_value_checks(&calc, "divide", 2, false, [Check::min(0.0)])
        .unwrap();
    validator
        .add_method_parameter_checks(&calc, "divide", 2, 1, [Check::not_member_of(["0"], false)])
        .unwrap();
    let obj = Object::new(&calc);

    let violations = validator
        .validate_method_parameters(&obj, "divide", &[Value::from(4), Value::from(0)])
        .unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].context.to_string(), "Calculator.divide(b)");

    let violations = validator
        .validate_method_return_value(&obj, "divide", 2, &Value::from(-2))
        .unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].context.to_string(), "Calculator.divide()");
}

#[test]
fn test_message_resolver_and_configured_messages() {
    let person = ClassBuilder::new("Person")
        .field("name", ValueKind::String)
        .build();
    let configurer = ProgrammaticConfigurer::new();
    configurer.add_class_config(
        ClassConfigBuilder::new("Person")
            .field(
                "name",
                [Check::length(2, 3).with_error_code("person.name.length")],
            )
            .build(),
    );
    let resolver = TableMessageResolver::new()
        .with_message("person.name.length", "{context} needs {min} to {max} letters, got '{invalidValue}'");
    let validator = Validator::with_config(
        ValidatorConfig::new()
            .configurer(configurer)
            .message_resolver(resolver),
    );

    let obj = Object::with_values(&person, [("name", "Bartholomew")]).unwrap();
    let violations = validator.validate(&obj).unwrap();
    assert_eq!(
        violations[0].message,
        "Person.name needs 2 to 3 letters, got 'Bartholomew'"
    );
    assert_eq!(violations[0].error_code, "person.name.length");
}

#[test]
fn test_reconfigure_drops_programmatic_checks() {
    let person = ClassBuilder::new("Person")
        .field("name", ValueKind::String)
        .build();
    let validator = Validator::new();
    validator
        .add_field_checks(&person, "name", [Check::not_null()])
        .unwrap();
    let nobody = Object::new(&person);
    assert_eq!(validator.validate(&nobody).unwrap().len(), 1);

    validator.reconfigure(&person).unwrap();
    assert!(validator.validate(&nobody).unwrap().is_empty());
}
