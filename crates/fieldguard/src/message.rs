//! Locale dictionary and message resolution.

use crate::definition::{MessageFn, ValidatorDefinition, DEFAULT_MESSAGE};
use crate::registry::Scope;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The always-present fallback locale.
pub const DEFAULT_LOCALE: &str = "en";

/// Messages keyed by locale, then by validator name.
///
/// Merging replaces single `(locale, name)` leaves; nothing is ever removed.
#[derive(Clone, Default)]
pub struct Dictionary {
    locales: HashMap<String, HashMap<String, MessageFn>>,
}

impl Dictionary {
    /// Create a dictionary holding an empty `en` locale.
    pub fn new() -> Self {
        let mut locales = HashMap::new();
        locales.insert(DEFAULT_LOCALE.to_string(), HashMap::new());
        Self { locales }
    }

    /// Set one message, replacing any previous entry for the same leaf.
    pub fn insert<F>(&mut self, locale: impl Into<String>, name: impl Into<String>, message: F)
    where
        F: Fn(&str, &[String]) -> String + Send + Sync + 'static,
    {
        self.insert_arc(locale.into(), name.into(), Arc::new(message));
    }

    fn insert_arc(&mut self, locale: String, name: String, message: MessageFn) {
        self.locales.entry(locale).or_default().insert(name, message);
    }

    /// Deep-merge `partial` into this dictionary.
    pub fn merge(&mut self, partial: Dictionary) {
        for (locale, messages) in partial.locales {
            for (name, message) in messages {
                self.insert_arc(locale.clone(), name, message);
            }
        }
    }

    /// Look up a message leaf.
    pub fn get(&self, locale: &str, name: &str) -> Option<&MessageFn> {
        self.locales.get(locale).and_then(|m| m.get(name))
    }

    /// Check whether a message leaf exists.
    pub fn has_message(&self, locale: &str, name: &str) -> bool {
        self.get(locale, name).is_some()
    }

    /// Locales with at least an entry table, sorted.
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.locales.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for locale in self.locales() {
            let mut names: Vec<&String> = self.locales[locale].keys().collect();
            names.sort_unstable();
            map.entry(&locale, &names);
        }
        map.finish()
    }
}

/// Turns a failed rule into its message.
///
/// Lookup order for a locale is the dictionary, then the definition's own
/// per-locale messages. The requested locale is tried first, then `en`,
/// then the definition's `get_message`, then the default template.
///
/// The dictionary is keyed by validator name and belongs to the shared
/// registry, so it only applies to [`Scope::Shared`] definitions. An engine's
/// own validator that shadows a shared name keeps its own messages.
pub struct MessageResolver<'a> {
    dictionary: &'a Dictionary,
}

impl<'a> MessageResolver<'a> {
    /// Create a resolver over a dictionary.
    pub fn new(dictionary: &'a Dictionary) -> Self {
        Self { dictionary }
    }

    /// Resolve the message for a failed rule.
    pub fn resolve(
        &self,
        definition: &ValidatorDefinition,
        scope: Scope,
        field: &str,
        params: &[String],
        locale: &str,
    ) -> String {
        let localized = self.localized(definition, scope, locale).or_else(|| {
            (locale != DEFAULT_LOCALE)
                .then(|| self.localized(definition, scope, DEFAULT_LOCALE))
                .flatten()
        });
        if let Some(message) = localized.or(definition.get_message()) {
            return message(field, params);
        }
        default_message(field)
    }

    fn localized<'d>(
        &'d self,
        definition: &'d ValidatorDefinition,
        scope: Scope,
        locale: &str,
    ) -> Option<&'d MessageFn> {
        let shared = match scope {
            Scope::Shared => self.dictionary.get(locale, definition.name()),
            Scope::Instance => None,
        };
        shared.or_else(|| definition.message_for(locale))
    }
}

/// Render the default message template.
pub fn default_message(field: &str) -> String {
    DEFAULT_MESSAGE.replace("{field}", field)
}

/// Message recorded for a rule name that resolves to no validator.
pub fn unknown_rule_message(field: &str, rule: &str) -> String {
    format!("The {field} field uses an unknown rule \"{rule}\".")
}
