//! Engine configuration.
//!
//! Field rules and the starting locale can be declared as data (any serde
//! format) or read from `FIELDGUARD_*` environment variables.
//!
//! ```ignore
//! use fieldguard::{EngineConfig, ValidationEngine};
//!
//! let config: EngineConfig = serde_json::from_str(r#"{
//!     "locale": "ar",
//!     "fields": { "email": "required|email", "name": "required|min:3" }
//! }"#)?;
//! let engine = ValidationEngine::from_config(&config)?;
//! ```

use crate::error::ConfigError;
use crate::message::DEFAULT_LOCALE;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Prefix for environment variables read by [`EngineConfig::from_env`].
pub const ENV_PREFIX: &str = "FIELDGUARD_";

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

/// Declarative engine setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Active locale for messages
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Field name to rule expression, in declaration order
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

/// The subset of settings that can come from the environment.
#[derive(Debug, Deserialize)]
struct EnvSettings {
    #[serde(default = "default_locale")]
    locale: String,
}

impl EngineConfig {
    /// Config with the default locale and no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from `FIELDGUARD_*` environment variables.
    ///
    /// Only `FIELDGUARD_LOCALE` is recognised; fields are declared in code
    /// or in a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`from_env`](Self::from_env) over an explicit variable list.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let settings: EnvSettings = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        Ok(Self {
            locale: settings.locale,
            fields: IndexMap::new(),
        })
    }

    /// Set the locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Declare a field.
    pub fn field(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.fields.insert(name.into(), expression.into());
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            fields: IndexMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationEngine;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_defaults_to_en() {
        let config = EngineConfig::from_vars(vars(&[("PATH", "/bin")])).unwrap();
        assert_eq!(config.locale, "en");
        assert!(config.fields.is_empty());
    }

    #[test]
    fn env_sets_locale() {
        let config = EngineConfig::from_vars(vars(&[("FIELDGUARD_LOCALE", "ar")])).unwrap();
        assert_eq!(config.locale, "ar");
    }

    #[test]
    fn deserializes_with_field_order() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"fields": {"name": "required|min:3", "email": "required|email"}}"#,
        )
        .unwrap();
        assert_eq!(config.locale, "en");
        assert_eq!(
            config.fields.keys().collect::<Vec<_>>(),
            vec!["name", "email"]
        );
    }

    #[test]
    fn builds_engine() {
        let config = EngineConfig::new()
            .locale("ar")
            .field("email", "required|email")
            .field("name", "required");
        let engine = ValidationEngine::from_config(&config).unwrap();
        assert_eq!(engine.locale(), "ar");
        assert_eq!(engine.fields().collect::<Vec<_>>(), vec!["email", "name"]);
        assert_eq!(engine.rules("email").unwrap().to_string(), "required|email");
    }

    #[test]
    fn rejects_blank_field_names() {
        let config = EngineConfig::new().field("  ", "required");
        assert!(matches!(
            ValidationEngine::from_config(&config),
            Err(ConfigError::EmptyFieldName)
        ));
    }
}
