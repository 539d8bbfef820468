//! Per-field rule dispatch.

use crate::definition::{RuleOutcome, ValidatorDefinition};
use crate::error::RuleRejection;
use crate::error_bag::ErrorEntry;
use crate::message::{unknown_rule_message, MessageResolver};
use crate::registry::{Lookup, Scope};
use crate::rule::{self, FieldRules};
use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{trace, warn};

/// One field's parsed rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidator {
    field: String,
    rules: FieldRules,
}

impl FieldValidator {
    /// Create a validator from already parsed rules.
    pub fn new(field: impl Into<String>, rules: FieldRules) -> Self {
        Self {
            field: field.into(),
            rules,
        }
    }

    /// Create a validator from a rule expression.
    pub fn parse(field: impl Into<String>, expression: &str) -> Self {
        Self::new(field, rule::parse(expression))
    }

    /// Field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    /// Invoke every rule against `value`.
    ///
    /// `extra` is appended to each rule's own parameters. Nothing is skipped:
    /// an unresolved rule name settles as a failure and the remaining rules
    /// still run.
    pub(crate) fn dispatch(&self, value: &Value, extra: &[String], lookup: Lookup<'_>) -> Dispatch {
        let checks = self
            .rules
            .iter()
            .map(|spec| {
                let mut params = spec.params.clone();
                params.extend_from_slice(extra);
                let definition = lookup.resolve_scoped(&spec.name);
                let state = match &definition {
                    Some((def, _)) => match def.check(value, &params) {
                        RuleOutcome::Sync(passed) => CheckState::Settled(passed),
                        RuleOutcome::Pending(fut) => CheckState::Pending(fut),
                    },
                    None => {
                        warn!(field = %self.field, rule = %spec.name, "rule not found");
                        CheckState::Settled(false)
                    }
                };
                Check {
                    call: RuleCall {
                        name: spec.name.clone(),
                        params,
                        definition,
                    },
                    state,
                }
            })
            .collect();

        Dispatch {
            field: self.field.clone(),
            checks,
        }
    }
}

/// A rule invocation, kept around to build its message if it fails.
pub(crate) struct RuleCall {
    name: String,
    params: Vec<String>,
    definition: Option<(Arc<ValidatorDefinition>, Scope)>,
}

impl RuleCall {
    pub(crate) fn into_entry(
        self,
        field: &str,
        resolver: &MessageResolver<'_>,
        locale: &str,
    ) -> ErrorEntry {
        let message = match &self.definition {
            Some((def, scope)) => resolver.resolve(def, *scope, field, &self.params, locale),
            None => unknown_rule_message(field, &self.name),
        };
        ErrorEntry::new(field, self.name, message)
    }
}

enum CheckState {
    Settled(bool),
    Pending(BoxFuture<'static, Result<bool, RuleRejection>>),
}

impl CheckState {
    fn now(&self) -> Option<bool> {
        match self {
            Self::Settled(passed) => Some(*passed),
            Self::Pending(_) => None,
        }
    }

    fn into_future(self) -> BoxFuture<'static, Result<bool, RuleRejection>> {
        match self {
            Self::Settled(passed) => future::ready(Ok(passed)).boxed(),
            Self::Pending(fut) => fut,
        }
    }
}

struct Check {
    call: RuleCall,
    state: CheckState,
}

/// Rules of one field in flight.
pub(crate) struct Dispatch {
    field: String,
    checks: Vec<Check>,
}

/// Failing rules of one field, in declaration order.
pub(crate) struct FieldOutcome {
    pub(crate) field: String,
    pub(crate) failures: Vec<RuleCall>,
}

impl FieldOutcome {
    pub(crate) fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Dispatch {
    pub(crate) fn is_pending(&self) -> bool {
        self.checks.iter().any(|c| c.state.now().is_none())
    }

    /// Settle without waiting, or hand the dispatch back if a rule is pending.
    pub(crate) fn settle_now(self) -> Result<FieldOutcome, Self> {
        let outcomes: Option<Vec<bool>> = self.checks.iter().map(|c| c.state.now()).collect();
        match outcomes {
            Some(outcomes) => {
                let calls = self.checks.into_iter().map(|c| c.call);
                Ok(conclude(self.field, calls.zip(outcomes.into_iter().map(Ok))))
            }
            None => Err(self),
        }
    }

    /// Wait for every rule to settle; pending rules run concurrently.
    pub(crate) async fn settle(self) -> FieldOutcome {
        let (calls, futures): (Vec<_>, Vec<_>) = self
            .checks
            .into_iter()
            .map(|c| (c.call, c.state.into_future()))
            .unzip();
        let outcomes = future::join_all(futures).await;
        conclude(self.field, calls.into_iter().zip(outcomes))
    }
}

fn conclude(
    field: String,
    results: impl Iterator<Item = (RuleCall, Result<bool, RuleRejection>)>,
) -> FieldOutcome {
    let failures = results
        .filter_map(|(call, result)| match result {
            Ok(true) => None,
            Ok(false) => Some(call),
            Err(rejection) => {
                warn!(field = %field, rule = %call.name, %rejection, "async rule rejected");
                Some(call)
            }
        })
        .collect::<Vec<_>>();
    trace!(field = %field, failures = failures.len(), "field settled");
    FieldOutcome { field, failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ValidatorSpec;
    use crate::registry::{InstanceValidators, ValidatorRegistry};
    use serde_json::json;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    /// Captures the `rule` field of every WARN event.
    #[derive(Clone, Default)]
    struct WarnCapture {
        rules: Arc<Mutex<Vec<String>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCapture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if *event.metadata().level() != tracing::Level::WARN {
                return;
            }
            let mut visitor = RuleVisitor(None);
            event.record(&mut visitor);
            if let Some(rule) = visitor.0 {
                self.rules.lock().unwrap().push(rule);
            }
        }
    }

    struct RuleVisitor(Option<String>);

    impl tracing::field::Visit for RuleVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "rule" {
                self.0 = Some(format!("{value:?}"));
            }
        }
    }

    fn failed_rules(outcome: &FieldOutcome) -> Vec<&str> {
        outcome.failures.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn sync_rules_settle_immediately() {
        let shared = ValidatorRegistry::with_builtins();
        let instance = InstanceValidators::new();
        let validator = FieldValidator::parse("name", "required|min:3");

        let dispatch = validator.dispatch(&json!(""), &[], Lookup::new(&instance, &shared));
        assert!(!dispatch.is_pending());
        let outcome = dispatch.settle_now().ok().unwrap();
        assert!(!outcome.passed());
        assert_eq!(failed_rules(&outcome), vec!["required", "min"]);
    }

    #[test]
    fn unknown_rule_fails_without_stopping_others() {
        let shared = ValidatorRegistry::with_builtins();
        let instance = InstanceValidators::new();
        let validator = FieldValidator::parse("name", "nope|min:3");

        let dispatch = validator.dispatch(&json!("ab"), &[], Lookup::new(&instance, &shared));
        let outcome = dispatch.settle_now().ok().unwrap();
        assert_eq!(failed_rules(&outcome), vec!["nope", "min"]);
    }

    #[test]
    fn unresolved_rule_is_logged_as_warning() {
        let capture = WarnCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let shared = ValidatorRegistry::with_builtins();
        let instance = InstanceValidators::new();
        let validator = FieldValidator::parse("name", "required|nope|min:3");
        let dispatch = validator.dispatch(&json!("ab"), &[], Lookup::new(&instance, &shared));
        assert!(!dispatch.settle_now().ok().unwrap().passed());

        assert_eq!(*capture.rules.lock().unwrap(), vec!["nope".to_string()]);
    }

    #[test]
    fn extra_params_are_appended() {
        let shared = ValidatorRegistry::empty();
        let mut instance = InstanceValidators::new();
        instance
            .register(
                "size",
                ValidatorSpec::predicate(|_, params| (params == ["10", "20", "30"]).into()),
            )
            .unwrap();
        let validator = FieldValidator::parse("img", "size:10");

        let extra = vec!["20".to_string(), "30".to_string()];
        let dispatch = validator.dispatch(&json!(null), &extra, Lookup::new(&instance, &shared));
        assert!(dispatch.settle_now().ok().unwrap().passed());
    }

    #[tokio::test]
    async fn pending_rules_are_joined() {
        let shared = ValidatorRegistry::with_builtins();
        let mut instance = InstanceValidators::new();
        instance
            .register(
                "remote",
                ValidatorSpec::predicate(|_, _| RuleOutcome::future(async { false })),
            )
            .unwrap();
        instance
            .register(
                "flaky",
                ValidatorSpec::predicate(|_, _| {
                    RuleOutcome::fallible(async { Err::<bool, _>("connection reset") })
                }),
            )
            .unwrap();
        let validator = FieldValidator::parse("user", "required|remote|flaky");

        let dispatch = validator.dispatch(&json!("x"), &[], Lookup::new(&instance, &shared));
        assert!(dispatch.is_pending());
        let dispatch = match dispatch.settle_now() {
            Ok(_) => panic!("should still be pending"),
            Err(dispatch) => dispatch,
        };
        let outcome = dispatch.settle().await;
        assert_eq!(failed_rules(&outcome), vec!["remote", "flaky"]);
    }

    #[test]
    fn failure_without_definition_uses_unknown_message() {
        let dict = crate::message::Dictionary::new();
        let call = RuleCall {
            name: "nope".into(),
            params: vec![],
            definition: None,
        };
        let entry = call.into_entry("name", &MessageResolver::new(&dict), "en");
        assert_eq!(entry.rule, "nope");
        assert_eq!(
            entry.message,
            "The name field uses an unknown rule \"nope\"."
        );
    }
}
