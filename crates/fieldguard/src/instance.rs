//! Owner-keyed engine registry.
//!
//! Hosts that tie an engine to some external object (a form, a view, a
//! request handler) hand each owner an [`OwnerKey`] and ask the registry for
//! that owner's engine. Keys compare by identity: every `OwnerKey::new()`
//! is distinct, and only clones of a key refer to the same owner.

use crate::engine::ValidationEngine;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Opaque identity token for an engine owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerKey(u64);

impl OwnerKey {
    /// Allocate a fresh identity.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric id, for logging.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Engine shared between an owner and the registry.
///
/// An async mutex, since a pending verdict keeps the engine borrowed across
/// awaits.
pub type SharedEngine = Arc<AsyncMutex<ValidationEngine>>;

type Factory = Box<dyn Fn() -> ValidationEngine + Send + Sync>;

/// Maps owners to their engines.
pub struct InstanceRegistry {
    engines: Mutex<HashMap<OwnerKey, SharedEngine>>,
    factory: Factory,
}

impl InstanceRegistry {
    /// Registry that creates rule-less engines over the global registry.
    pub fn new() -> Self {
        Self::with_factory(ValidationEngine::create)
    }

    /// Registry that creates engines with `factory`.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> ValidationEngine + Send + Sync + 'static,
    {
        Self {
            engines: Mutex::new(HashMap::new()),
            factory: Box::new(factory),
        }
    }

    fn engines(&self) -> MutexGuard<'_, HashMap<OwnerKey, SharedEngine>> {
        self.engines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The owner's engine, created on first request.
    pub fn register(&self, owner: &OwnerKey) -> SharedEngine {
        self.engines()
            .entry(owner.clone())
            .or_insert_with(|| {
                debug!(owner = owner.id(), "creating engine for owner");
                Arc::new(AsyncMutex::new((self.factory)()))
            })
            .clone()
    }

    /// Drop the owner's engine. Returns whether one was registered.
    ///
    /// A later `register` for the same owner creates a fresh engine.
    pub fn unregister(&self, owner: &OwnerKey) -> bool {
        let removed = self.engines().remove(owner).is_some();
        debug!(owner = owner.id(), removed, "unregistered owner");
        removed
    }

    /// The owner's engine, without creating one.
    pub fn get(&self, owner: &OwnerKey) -> Option<SharedEngine> {
        self.engines().get(owner).cloned()
    }

    /// Check whether the owner has an engine.
    pub fn contains(&self, owner: &OwnerKey) -> bool {
        self.engines().contains_key(owner)
    }

    /// Number of registered owners.
    pub fn len(&self) -> usize {
        self.engines().len()
    }

    /// True when no owner is registered.
    pub fn is_empty(&self) -> bool {
        self.engines().is_empty()
    }
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("owners", &self.len())
            .finish()
    }
}
