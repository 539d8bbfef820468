//! Validator definitions.
//!
//! A validator is registered either as a bare predicate or as a definition
//! object carrying its own message strategy. Both shapes are normalized into
//! a [`ValidatorDefinition`] at registration time.

use crate::error::{RegistryError, RuleRejection};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Predicate signature shared by every validator: `(value, params) -> outcome`.
pub type PredicateFn = Arc<dyn Fn(&Value, &[String]) -> RuleOutcome + Send + Sync>;

/// Message producer signature: `(field, params) -> message`.
pub type MessageFn = Arc<dyn Fn(&str, &[String]) -> String + Send + Sync>;

/// Default message template for definitions without a message strategy.
pub const DEFAULT_MESSAGE: &str = "The {field} value is not valid.";

/// Result of invoking a predicate.
///
/// Rules that can answer immediately return [`RuleOutcome::Sync`]; rules that
/// need to wait on I/O return [`RuleOutcome::Pending`]. A pending rule that
/// resolves to `Err` is treated as a failed rule.
pub enum RuleOutcome {
    /// Verdict is known now
    Sync(bool),
    /// Verdict arrives later
    Pending(BoxFuture<'static, Result<bool, RuleRejection>>),
}

impl RuleOutcome {
    /// Wrap an infallible future.
    pub fn future<F>(fut: F) -> Self
    where
        F: Future<Output = bool> + Send + 'static,
    {
        Self::Pending(fut.map(Ok).boxed())
    }

    /// Wrap a future that may reject.
    pub fn fallible<F, E>(fut: F) -> Self
    where
        F: Future<Output = Result<bool, E>> + Send + 'static,
        E: fmt::Display,
    {
        Self::Pending(fut.map(|r| r.map_err(RuleRejection::new)).boxed())
    }

    /// True if the outcome is not yet known.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl From<bool> for RuleOutcome {
    fn from(passed: bool) -> Self {
        Self::Sync(passed)
    }
}

impl fmt::Debug for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(passed) => f.debug_tuple("Sync").field(passed).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Object-form validator definition.
///
/// Every field is optional so that incomplete definitions can be expressed
/// and rejected at registration. A usable definition has a `validate`
/// predicate and at least one of `get_message` or `messages`.
#[derive(Clone, Default)]
pub struct DefinitionObject {
    /// The predicate
    pub validate: Option<PredicateFn>,
    /// Locale-agnostic message
    pub get_message: Option<MessageFn>,
    /// Per-locale messages
    pub messages: Option<HashMap<String, MessageFn>>,
}

impl DefinitionObject {
    /// Create an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the predicate.
    pub fn validate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value, &[String]) -> RuleOutcome + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(predicate));
        self
    }

    /// Set the locale-agnostic message.
    pub fn get_message<F>(mut self, message: F) -> Self
    where
        F: Fn(&str, &[String]) -> String + Send + Sync + 'static,
    {
        self.get_message = Some(Arc::new(message));
        self
    }

    /// Add a message for one locale.
    pub fn message<F>(mut self, locale: impl Into<String>, message: F) -> Self
    where
        F: Fn(&str, &[String]) -> String + Send + Sync + 'static,
    {
        self.messages
            .get_or_insert_with(HashMap::new)
            .insert(locale.into(), Arc::new(message));
        self
    }
}

impl fmt::Debug for DefinitionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionObject")
            .field("validate", &self.validate.is_some())
            .field("get_message", &self.get_message.is_some())
            .field(
                "messages",
                &self.messages.as_ref().map(|m| m.keys().collect::<Vec<_>>()),
            )
            .finish()
    }
}

/// Registration input: either a bare predicate or a definition object.
#[derive(Clone)]
pub enum ValidatorSpec {
    /// Bare predicate, paired with the default message
    Predicate(PredicateFn),
    /// Full definition object
    Object(DefinitionObject),
}

impl ValidatorSpec {
    /// Shorthand for registering a bare predicate.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value, &[String]) -> RuleOutcome + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Check the shape and build the normalized definition.
    pub(crate) fn normalize(self, name: &str) -> Result<ValidatorDefinition, RegistryError> {
        match self {
            Self::Predicate(validate) => Ok(ValidatorDefinition::from_predicate(name, validate)),
            Self::Object(object) => {
                let validate = object
                    .validate
                    .ok_or_else(|| RegistryError::invalid(name, "missing a validate function"))?;
                if object.get_message.is_none() && object.messages.is_none() {
                    return Err(RegistryError::invalid(
                        name,
                        "needs either get_message or messages",
                    ));
                }
                Ok(ValidatorDefinition {
                    name: name.to_string(),
                    validate,
                    get_message: object.get_message,
                    messages: object.messages.unwrap_or_default(),
                })
            }
        }
    }
}

impl From<DefinitionObject> for ValidatorSpec {
    fn from(object: DefinitionObject) -> Self {
        Self::Object(object)
    }
}

impl fmt::Debug for ValidatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Object(object) => f.debug_tuple("Object").field(object).finish(),
        }
    }
}

/// A registered validator in normalized form.
#[derive(Clone)]
pub struct ValidatorDefinition {
    name: String,
    validate: PredicateFn,
    get_message: Option<MessageFn>,
    messages: HashMap<String, MessageFn>,
}

impl ValidatorDefinition {
    /// Bare predicates always normalize; they carry no message strategy.
    pub(crate) fn from_predicate(name: &str, validate: PredicateFn) -> Self {
        Self {
            name: name.to_string(),
            validate,
            get_message: None,
            messages: HashMap::new(),
        }
    }

    /// Name the definition is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the predicate.
    pub fn check(&self, value: &Value, params: &[String]) -> RuleOutcome {
        (self.validate)(value, params)
    }

    /// Locale-agnostic message, if any.
    pub fn get_message(&self) -> Option<&MessageFn> {
        self.get_message.as_ref()
    }

    /// Message for an exact locale, if any.
    pub fn message_for(&self, locale: &str) -> Option<&MessageFn> {
        self.messages.get(locale)
    }
}

impl fmt::Debug for ValidatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorDefinition")
            .field("name", &self.name)
            .field("get_message", &self.get_message.is_some())
            .field("messages", &self.messages.keys().collect::<Vec<_>>())
            .finish()
    }
}
