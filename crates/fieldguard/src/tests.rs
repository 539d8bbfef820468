//! Property-based tests for fieldguard.

#[cfg(test)]
mod property_tests {
    use crate::definition::{DefinitionObject, RuleOutcome, ValidatorSpec};
    use crate::engine::ValidationEngine;
    use crate::error::RegistryError;
    use crate::registry::ValidatorRegistry;
    use crate::rule::{parse, FieldRules};
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn private_engine() -> ValidationEngine {
        ValidationEngine::with_registry(Arc::new(ValidatorRegistry::with_builtins()))
    }

    // Expressions built from every delimiter plus whitespace
    fn expression_strategy() -> impl Strategy<Value = String> {
        "[a-z0-9 :,|_]{0,40}"
    }

    fn rule_expression_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just("required".to_string()),
                Just("email".to_string()),
                Just("alpha".to_string()),
                (1usize..6).prop_map(|n| format!("min:{n}")),
                (1usize..12).prop_map(|n| format!("max:{n}")),
                Just("unknown_rule".to_string()),
            ],
            0..4,
        )
        .prop_map(|rules| rules.join("|"))
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            "[a-zA-Z@. ]{0,12}".prop_map(Value::String),
            (0i64..1000).prop_map(|n| json!(n)),
        ]
    }

    proptest! {
        #[test]
        fn reserialized_rules_parse_identically(expression in expression_strategy()) {
            let rules = parse(&expression);
            let reparsed = parse(&rules.to_string());
            prop_assert_eq!(reparsed, rules);
        }

        #[test]
        fn from_str_agrees_with_parse(expression in expression_strategy()) {
            let via_from_str: FieldRules = expression.parse().unwrap();
            prop_assert_eq!(via_from_str, parse(&expression));
        }

        #[test]
        fn validate_all_is_conjunction_of_fields(
            email_rules in rule_expression_strategy(),
            name_rules in rule_expression_strategy(),
            email in value_strategy(),
            name in value_strategy(),
        ) {
            let mut each = private_engine();
            each.attach("email", &email_rules);
            each.attach("name", &name_rules);
            let email_ok = each.validate("email", &email).ready().unwrap();
            let name_ok = each.validate("name", &name).ready().unwrap();
            let expected_errors = each.errors().all();

            let mut all = private_engine();
            all.attach("email", &email_rules);
            all.attach("name", &name_rules);
            let passed = all.validate_all(&json!({"email": email, "name": name})).ready();

            prop_assert_eq!(passed, Some(email_ok && name_ok));
            prop_assert_eq!(all.errors().all(), expected_errors);
        }

        #[test]
        fn attach_is_idempotent_overwrite(expression in rule_expression_strategy()) {
            let mut engine = private_engine();
            engine.attach("field", "required|min:3");
            let _ = engine.validate("field", &Value::Null);

            engine.attach("field", &expression);
            let first = engine.rules("field").cloned();
            prop_assert!(!engine.errors().has("field"));

            let _ = engine.validate("field", &Value::Null);
            engine.attach("field", &expression);
            prop_assert_eq!(engine.rules("field").cloned(), first);
            prop_assert!(!engine.errors().has("field"));
        }

        #[test]
        fn global_reregistration_always_fails(well_formed in any::<bool>()) {
            static COUNTER: AtomicUsize = AtomicUsize::new(0);
            let name = format!("prop_global_{}", COUNTER.fetch_add(1, Ordering::Relaxed));

            ValidationEngine::extend_global(&name, ValidatorSpec::predicate(|_, _| true.into()))
                .unwrap();
            let second: ValidatorSpec = if well_formed {
                DefinitionObject::new()
                    .validate(|_, _| false.into())
                    .get_message(|f, _| format!("{f} no"))
                    .into()
            } else {
                DefinitionObject::new().into()
            };
            prop_assert_eq!(
                ValidationEngine::extend_global(&name, second),
                Err(RegistryError::DuplicateValidator(name.clone()))
            );
        }

        #[test]
        fn instance_extend_is_isolated(value in value_strategy()) {
            let shared = Arc::new(ValidatorRegistry::with_builtins());
            let mut a = ValidationEngine::with_registry(shared.clone());
            let mut b = ValidationEngine::with_registry(shared);
            a.extend("required", ValidatorSpec::predicate(|_, _| RuleOutcome::Sync(true))).unwrap();
            a.attach("f", "required");
            b.attach("f", "required");

            prop_assert_eq!(a.validate("f", &value).ready(), Some(true));
            let b_passed = b.validate("f", &value).ready().unwrap();
            let present = match &value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            };
            prop_assert_eq!(b_passed, present);
        }
    }
}
