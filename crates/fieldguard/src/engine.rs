//! The validation engine.

use crate::config::EngineConfig;
use crate::definition::ValidatorSpec;
use crate::error::{ConfigError, Result};
use crate::error_bag::{ErrorBag, ErrorEntry};
use crate::field::{Dispatch, FieldOutcome, FieldValidator};
use crate::message::{Dictionary, MessageResolver, DEFAULT_LOCALE};
use crate::registry::{InstanceValidators, Lookup, ValidatorRegistry};
use crate::rule::FieldRules;
use futures_util::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;
use tracing::{debug, trace};

static NULL: Value = Value::Null;

/// Result of a validation call.
///
/// `Ready` when every invoked rule answered synchronously, `Pending` when at
/// least one rule is still running. Both can be awaited.
///
/// A verdict holds the engine's mutable borrow until it is dropped, in either
/// variant. Take the result straight away in synchronous code:
///
/// ```rust
/// use fieldguard::ValidationEngine;
/// use serde_json::json;
///
/// let mut engine = ValidationEngine::new([("name", "required")]);
/// let passed = engine.validate_all(&json!({})).ready();
///
/// assert_eq!(passed, Some(false));
/// assert_eq!(engine.errors().count(), 1);
/// ```
#[must_use = "a pending verdict records nothing until awaited"]
pub enum Verdict<'a> {
    /// Already settled
    Ready(bool),
    /// Settles once every outstanding rule has
    Pending(BoxFuture<'a, bool>),
}

impl Verdict<'_> {
    /// The result, if settled.
    pub fn ready(&self) -> Option<bool> {
        match self {
            Self::Ready(passed) => Some(*passed),
            Self::Pending(_) => None,
        }
    }

    /// True if some rule is still running.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl<'a> IntoFuture for Verdict<'a> {
    type Output = bool;
    type IntoFuture = BoxFuture<'a, bool>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Ready(passed) => future::ready(passed).boxed(),
            Self::Pending(fut) => fut,
        }
    }
}

impl fmt::Debug for Verdict<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(passed) => f.debug_tuple("Ready").field(passed).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Validates named fields against their rule expressions.
///
/// ## Example
///
/// ```rust
/// use fieldguard::ValidationEngine;
/// use serde_json::json;
///
/// let mut engine = ValidationEngine::new([("name", "required|min:3")]);
/// let passed = engine.validate("name", &json!("Jo")).ready();
///
/// assert_eq!(passed, Some(false));
/// assert_eq!(
///     engine.errors().first("name"),
///     Some("The name must be at least 3 characters.")
/// );
/// ```
///
/// Fields with no attached rules always pass and record nothing.
pub struct ValidationEngine {
    fields: IndexMap<String, FieldValidator>,
    errors: ErrorBag,
    locale: String,
    validators: InstanceValidators,
    registry: Arc<ValidatorRegistry>,
}

impl ValidationEngine {
    /// Create an engine over the process-wide registry with the given rules.
    pub fn new<I, K, E>(rules: I) -> Self
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: AsRef<str>,
    {
        let mut engine = Self::create();
        for (field, expression) in rules {
            engine.attach(field, expression.as_ref());
        }
        engine
    }

    /// Create an engine with no rules.
    pub fn create() -> Self {
        Self::with_registry(ValidatorRegistry::global())
    }

    /// Create an engine with no rules over a specific registry.
    pub fn with_registry(registry: Arc<ValidatorRegistry>) -> Self {
        Self {
            fields: IndexMap::new(),
            errors: ErrorBag::new(),
            locale: DEFAULT_LOCALE.to_string(),
            validators: InstanceValidators::new(),
            registry,
        }
    }

    /// Create an engine from configuration over the process-wide registry.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        if config.fields.keys().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::EmptyFieldName);
        }
        let mut engine = Self::new(&config.fields);
        engine.set_locale(config.locale.clone());
        Ok(engine)
    }

    /// Register a validator in the process-wide registry.
    pub fn extend_global(name: &str, spec: impl Into<ValidatorSpec>) -> Result<()> {
        ValidatorRegistry::global().register(name, spec)
    }

    /// Merge messages into the process-wide dictionary.
    pub fn update_dictionary(partial: Dictionary) {
        ValidatorRegistry::global().update_dictionary(partial);
    }

    /// Register a validator visible to this engine only.
    ///
    /// Shadows any shared validator of the same name and replaces earlier
    /// instance registrations.
    pub fn extend(&mut self, name: &str, spec: impl Into<ValidatorSpec>) -> Result<()> {
        self.validators.register(name, spec)
    }

    /// Attach rules to a field, replacing any previous rules and errors.
    pub fn attach(&mut self, field: impl Into<String>, expression: &str) {
        let field = field.into();
        let validator = FieldValidator::parse(field.clone(), expression);
        debug!(field = %field, rules = %validator.rules(), "attaching rules");
        self.errors.remove(&field);
        self.fields.insert(field, validator);
    }

    /// Remove a field and its errors. Returns whether it was attached.
    pub fn detach(&mut self, field: &str) -> bool {
        self.errors.remove(field);
        let existed = self.fields.shift_remove(field).is_some();
        debug!(field, existed, "detached field");
        existed
    }

    /// Switch the locale used for new messages.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }

    /// The active locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Current failures.
    pub fn errors(&self) -> &ErrorBag {
        &self.errors
    }

    /// Mutable access to current failures.
    pub fn errors_mut(&mut self) -> &mut ErrorBag {
        &mut self.errors
    }

    /// Attached field names in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Rules attached to a field.
    pub fn rules(&self, field: &str) -> Option<&FieldRules> {
        self.fields.get(field).map(FieldValidator::rules)
    }

    /// The shared registry behind this engine.
    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }

    /// Validate one field.
    pub fn validate(&mut self, field: &str, value: &Value) -> Verdict<'_> {
        self.validate_with(field, value, &[])
    }

    /// Validate one field, appending `extra` to every rule's parameters.
    ///
    /// Earlier errors for the field are dropped first. The verdict is `true`
    /// iff no rule failed in this call.
    pub fn validate_with(&mut self, field: &str, value: &Value, extra: &[String]) -> Verdict<'_> {
        self.errors.remove(field);
        let Some(validator) = self.fields.get(field) else {
            trace!(field, "no rules attached");
            return Verdict::Ready(true);
        };
        let lookup = Lookup::new(&self.validators, &self.registry);
        match validator.dispatch(value, extra, lookup).settle_now() {
            Ok(outcome) => Verdict::Ready(self.record(outcome)),
            Err(pending) => Verdict::Pending(
                async move {
                    let outcome = pending.settle().await;
                    self.record(outcome)
                }
                .boxed(),
            ),
        }
    }

    /// Validate every attached field.
    ///
    /// Fields missing from `values` are validated as `null`. The verdict is
    /// the conjunction of every field's verdict, and errors are recorded in
    /// field declaration order once all fields have settled.
    pub fn validate_all(&mut self, values: &Value) -> Verdict<'_> {
        let lookup = Lookup::new(&self.validators, &self.registry);
        let dispatches: Vec<Dispatch> = self
            .fields
            .values()
            .map(|validator| {
                let value = values.get(validator.field()).unwrap_or(&NULL);
                validator.dispatch(value, &[], lookup)
            })
            .collect();
        for field in self.fields.keys() {
            self.errors.remove(field);
        }

        if dispatches.iter().any(Dispatch::is_pending) {
            Verdict::Pending(
                async move {
                    let settling = dispatches.into_iter().map(Dispatch::settle);
                    let outcomes = future::join_all(settling).await;
                    self.record_all(outcomes)
                }
                .boxed(),
            )
        } else {
            let outcomes = dispatches
                .into_iter()
                .filter_map(|d| d.settle_now().ok())
                .collect();
            Verdict::Ready(self.record_all(outcomes))
        }
    }

    fn record_all(&mut self, outcomes: Vec<FieldOutcome>) -> bool {
        outcomes
            .into_iter()
            .fold(true, |passed, outcome| self.record(outcome) && passed)
    }

    fn record(&mut self, outcome: FieldOutcome) -> bool {
        let passed = outcome.passed();
        let FieldOutcome { field, failures } = outcome;
        let locale = self.locale.as_str();
        let entries: Vec<ErrorEntry> = self.registry.with_dictionary(|dict| {
            let resolver = MessageResolver::new(dict);
            failures
                .into_iter()
                .map(|call| call.into_entry(&field, &resolver, locale))
                .collect()
        });
        trace!(field = %field, passed, "recorded verdict");
        self.errors.extend(entries);
        passed
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::create()
    }
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("errors", &self.errors.count())
            .field("locale", &self.locale)
            .field("instance_validators", &self.validators.len())
            .finish()
    }
}
