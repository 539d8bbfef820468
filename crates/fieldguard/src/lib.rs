//! # fieldguard
//!
//! Field validation driven by compact rule expressions such as
//! `"required|min:3|max:255"`. Each field's expression is parsed into an
//! ordered rule list; validating a value runs every rule, records one
//! localized message per failure in an [`ErrorBag`], and yields the
//! aggregate verdict.
//!
//! ## Example
//!
//! ```rust
//! use fieldguard::prelude::*;
//! use serde_json::json;
//!
//! let mut engine = ValidationEngine::new([
//!     ("email", "required|email"),
//!     ("name", "required|min:3"),
//! ]);
//!
//! let passed = engine
//!     .validate_all(&json!({ "email": "foo@bar.c", "name": "" }))
//!     .ready();
//! assert_eq!(passed, Some(false));
//! assert_eq!(
//!     engine.errors().all(),
//!     vec![
//!         "The email must be a valid email.",
//!         "The name is required.",
//!         "The name must be at least 3 characters.",
//!     ]
//! );
//! ```
//!
//! ## Validators
//!
//! Validators come from two tiers: the engine's own registrations
//! ([`ValidationEngine::extend`]) and a shared [`ValidatorRegistry`], by
//! default the process-wide one ([`ValidationEngine::extend_global`]). A
//! validator is a predicate `(value, params) -> RuleOutcome`, optionally with
//! per-locale messages:
//!
//! ```rust
//! use fieldguard::prelude::*;
//! use serde_json::json;
//!
//! let mut engine = ValidationEngine::create();
//! engine
//!     .extend(
//!         "even",
//!         DefinitionObject::new()
//!             .validate(|value, _| value.as_i64().is_some_and(|n| n % 2 == 0).into())
//!             .message("en", |field, _| format!("The {field} must be even.")),
//!     )
//!     .unwrap();
//! engine.attach("count", "required|even");
//!
//! assert_eq!(engine.validate("count", &json!(3)).ready(), Some(false));
//! assert_eq!(engine.errors().first("count"), Some("The count must be even."));
//! ```
//!
//! ## Asynchronous rules
//!
//! A predicate may return [`RuleOutcome::Pending`]. The verdict then becomes
//! [`Verdict::Pending`] and settles once every rule of the call has settled;
//! pending rules run concurrently. A rejected rule counts as a failure.
//!
//! A verdict borrows its engine mutably for as long as it lives, so take the
//! result (`.ready()` or `.await`) before reading [`ValidationEngine::errors`].
//!
//! ## Built-in validators
//!
//! - `required` - non-null, non-blank, non-empty
//! - `email` - email address format
//! - `url` - http(s)/ftp URL
//! - `min:n` / `max:n` - character (or element) count bounds
//! - `between:lo,hi` - numeric range
//! - `alpha`, `alpha_num`, `alpha_dash`, `numeric`, `digits:n`
//! - `in:a,b,..` / `not_in:a,b,..` - membership
//! - `regex:pattern` - pattern match (pattern may not contain `|` or `,`)

mod config;
mod definition;
mod engine;
mod error;
mod error_bag;
mod field;
mod instance;
mod message;
mod registry;
mod rule;
mod rules;

#[cfg(test)]
mod tests;

pub use config::{EngineConfig, ENV_PREFIX};
pub use definition::{
    DefinitionObject, MessageFn, PredicateFn, RuleOutcome, ValidatorDefinition, ValidatorSpec,
    DEFAULT_MESSAGE,
};
pub use engine::{ValidationEngine, Verdict};
pub use error::{ConfigError, RegistryError, RuleRejection};
pub use error_bag::{ErrorBag, ErrorEntry};
pub use field::FieldValidator;
pub use instance::{InstanceRegistry, OwnerKey, SharedEngine};
pub use message::{Dictionary, MessageResolver, DEFAULT_LOCALE};
pub use registry::{InstanceValidators, Lookup, Scope, ValidatorRegistry};
pub use rule::{parse, FieldRules, RuleSpec};
pub use rules::english;

/// Prelude module for fieldguard
pub mod prelude {
    pub use crate::definition::{DefinitionObject, RuleOutcome, ValidatorSpec};
    pub use crate::engine::{ValidationEngine, Verdict};
    pub use crate::error::{RegistryError, RuleRejection};
    pub use crate::error_bag::{ErrorBag, ErrorEntry};
    pub use crate::instance::{InstanceRegistry, OwnerKey};
    pub use crate::message::Dictionary;
    pub use crate::registry::ValidatorRegistry;
}
