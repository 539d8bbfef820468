//! Validator registries.
//!
//! Resolution is a two-tier chain: the engine's own [`InstanceValidators`]
//! first, then a shared [`ValidatorRegistry`]. The process-wide registry is
//! seeded with the built-in validators and their `en` messages on first use.

use crate::definition::{ValidatorDefinition, ValidatorSpec};
use crate::error::{RegistryError, Result};
use crate::message::Dictionary;
use crate::rules;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

static GLOBAL: OnceLock<Arc<ValidatorRegistry>> = OnceLock::new();

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Shared catalog of validators plus the locale dictionary.
///
/// Names are unique: registering an existing name fails. Registration is
/// expected at setup time; concurrent dictionary merges are last-write-wins.
pub struct ValidatorRegistry {
    validators: RwLock<HashMap<String, Arc<ValidatorDefinition>>>,
    dictionary: RwLock<Dictionary>,
}

impl ValidatorRegistry {
    /// Create a registry with no validators and an empty `en` locale.
    pub fn empty() -> Self {
        Self {
            validators: RwLock::new(HashMap::new()),
            dictionary: RwLock::new(Dictionary::new()),
        }
    }

    /// Create a registry seeded with the built-in validators.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        registry.seed();
        registry
    }

    /// The process-wide registry.
    pub fn global() -> Arc<ValidatorRegistry> {
        GLOBAL
            .get_or_init(|| {
                debug!("initializing global validator registry");
                Arc::new(Self::with_builtins())
            })
            .clone()
    }

    fn seed(&self) {
        let mut validators = write(&self.validators);
        for &(name, predicate) in rules::BUILTINS {
            let definition = ValidatorDefinition::from_predicate(name, Arc::new(predicate));
            validators.insert(name.to_string(), Arc::new(definition));
        }
        write(&self.dictionary).merge(rules::english());
        debug!(count = validators.len(), "seeded built-in validators");
    }

    /// Register a validator under a new name.
    ///
    /// Fails with [`RegistryError::DuplicateValidator`] if the name is taken,
    /// whether or not the new definition is well-formed, and with
    /// [`RegistryError::InvalidValidator`] if the definition is malformed.
    pub fn register(&self, name: &str, spec: impl Into<ValidatorSpec>) -> Result<()> {
        let mut validators = write(&self.validators);
        if validators.contains_key(name) {
            return Err(RegistryError::DuplicateValidator(name.to_string()));
        }
        let definition = spec.into().normalize(name)?;
        validators.insert(name.to_string(), Arc::new(definition));
        debug!(validator = name, "registered validator");
        Ok(())
    }

    /// Look up a validator.
    pub fn get(&self, name: &str) -> Option<Arc<ValidatorDefinition>> {
        read(&self.validators).get(name).cloned()
    }

    /// Check whether a validator exists.
    pub fn contains(&self, name: &str) -> bool {
        read(&self.validators).contains_key(name)
    }

    /// Registered validator names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.validators).keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Deep-merge messages into the dictionary.
    pub fn update_dictionary(&self, partial: Dictionary) {
        debug!(locales = ?partial.locales(), "merging dictionary");
        write(&self.dictionary).merge(partial);
    }

    /// Run `f` with read access to the dictionary.
    pub fn with_dictionary<R>(&self, f: impl FnOnce(&Dictionary) -> R) -> R {
        f(&*read(&self.dictionary))
    }

    /// Drop every registration and dictionary entry, then re-seed built-ins.
    pub fn reset(&self) {
        write(&self.validators).clear();
        *write(&self.dictionary) = Dictionary::new();
        self.seed();
        debug!("validator registry reset");
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("validators", &self.names())
            .field("dictionary", &*read(&self.dictionary))
            .finish()
    }
}

/// Validators registered on one engine; they shadow the shared registry.
#[derive(Debug, Clone, Default)]
pub struct InstanceValidators {
    validators: HashMap<String, Arc<ValidatorDefinition>>,
}

impl InstanceValidators {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a validator in the overlay.
    pub fn register(&mut self, name: &str, spec: impl Into<ValidatorSpec>) -> Result<()> {
        let definition = spec.into().normalize(name)?;
        if self
            .validators
            .insert(name.to_string(), Arc::new(definition))
            .is_some()
        {
            trace!(validator = name, "replaced instance validator");
        } else {
            debug!(validator = name, "registered instance validator");
        }
        Ok(())
    }

    /// Look up a validator in the overlay only.
    pub fn get(&self, name: &str) -> Option<Arc<ValidatorDefinition>> {
        self.validators.get(name).cloned()
    }

    /// Number of overlay validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// True when nothing is registered on the instance.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// Tier a validator was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Registered on the engine itself
    Instance,
    /// Registered in the shared registry
    Shared,
}

/// Resolution chain: instance overlay, then shared registry.
#[derive(Clone, Copy)]
pub struct Lookup<'a> {
    instance: &'a InstanceValidators,
    shared: &'a ValidatorRegistry,
}

impl<'a> Lookup<'a> {
    /// Create a lookup over both tiers.
    pub fn new(instance: &'a InstanceValidators, shared: &'a ValidatorRegistry) -> Self {
        Self { instance, shared }
    }

    /// Resolve a validator name.
    pub fn resolve(&self, name: &str) -> Option<Arc<ValidatorDefinition>> {
        self.resolve_scoped(name).map(|(definition, _)| definition)
    }

    /// Resolve a validator name along with the tier that supplied it.
    pub fn resolve_scoped(&self, name: &str) -> Option<(Arc<ValidatorDefinition>, Scope)> {
        match self.instance.get(name) {
            Some(definition) => Some((definition, Scope::Instance)),
            None => self.shared.get(name).map(|d| (d, Scope::Shared)),
        }
    }
}
