//! Error types for fieldguard.
//!
//! Only configuration mistakes are errors. A value failing its rules is
//! reported through the [`ErrorBag`](crate::ErrorBag), never as `Err`.

use std::fmt;
use thiserror::Error;

/// Configuration error raised while registering a validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A global validator with this name already exists.
    #[error("validator `{0}` is already registered globally")]
    DuplicateValidator(String),

    /// The definition lacks a capability every validator must expose.
    #[error("invalid validator `{name}`: {reason}")]
    InvalidValidator {
        /// Name the definition was registered under
        name: String,
        /// What is missing
        reason: &'static str,
    },
}

impl RegistryError {
    pub(crate) fn invalid(name: &str, reason: &'static str) -> Self {
        Self::InvalidValidator {
            name: name.to_string(),
            reason,
        }
    }
}

/// Error type for configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed.
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),

    /// A field was declared with a blank name.
    #[error("field names must not be empty")]
    EmptyFieldName,
}

/// Reason an asynchronous rule settled without a verdict.
///
/// A rejected rule counts as a failed rule; the reason is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRejection(pub String);

impl RuleRejection {
    /// Create a rejection from any displayable reason.
    pub fn new(reason: impl fmt::Display) -> Self {
        Self(reason.to_string())
    }
}

impl fmt::Display for RuleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule rejected: {}", self.0)
    }
}

impl std::error::Error for RuleRejection {}

/// Result type alias for registration operations.
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_names_the_validator() {
        let err = RegistryError::DuplicateValidator("email".to_string());
        assert_eq!(err.to_string(), "validator `email` is already registered globally");
    }

    #[test]
    fn invalid_message_includes_reason() {
        let err = RegistryError::invalid("slug", "missing a validate function");
        assert_eq!(
            err.to_string(),
            "invalid validator `slug`: missing a validate function"
        );
    }

    #[test]
    fn rejection_wraps_reason() {
        let rejection = RuleRejection::new("timeout after 3s");
        assert_eq!(rejection.0, "timeout after 3s");
        assert_eq!(rejection.to_string(), "rule rejected: timeout after 3s");
    }
}
