//! Rule expression parsing.
//!
//! A rule expression is a pipe-delimited list of validator invocations:
//!
//! ```text
//! required|min:3|between:1,10
//! ```
//!
//! Each token splits on its first `:` into a validator name and a parameter
//! string, and the parameter string splits on `,`. Delimiters cannot be
//! escaped, so parameters may not contain `|` or `,`.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// One parsed validator invocation: a name plus its raw parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Validator name, looked up at dispatch time
    pub name: String,
    /// Raw parameters in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl RuleSpec {
    /// Create a rule without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Create a rule with parameters.
    pub fn with_params<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    fn parse_token(token: &str) -> Self {
        match token.split_once(':') {
            Some((name, params)) => {
                let params = params.trim();
                let params = if params.is_empty() {
                    Vec::new()
                } else {
                    params.split(',').map(|p| p.trim().to_string()).collect()
                };
                Self {
                    name: name.trim().to_string(),
                    params,
                }
            }
            None => Self::new(token),
        }
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.name, self.params.join(","))
        }
    }
}

/// The ordered rule list attached to a single field.
///
/// Order follows the source expression and decides the order in which
/// failure messages are emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRules(Vec<RuleSpec>);

impl FieldRules {
    /// Create an empty rule list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the field has no rules.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the rules in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, RuleSpec> {
        self.0.iter()
    }

    /// Check whether a rule with the given name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|rule| rule.name == name)
    }
}

impl From<Vec<RuleSpec>> for FieldRules {
    fn from(rules: Vec<RuleSpec>) -> Self {
        Self(rules)
    }
}

impl<'a> IntoIterator for &'a FieldRules {
    type Item = &'a RuleSpec;
    type IntoIter = std::slice::Iter<'a, RuleSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{rule}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldRules {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse(s))
    }
}

/// Parse a rule expression into its ordered rule list.
///
/// Parsing never fails. Empty and nameless tokens are skipped, and unknown
/// validator names are only discovered when the field is validated, so
/// expressions may reference validators that are registered later.
pub fn parse(expression: &str) -> FieldRules {
    expression
        .trim()
        .split('|')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(RuleSpec::parse_token)
        .filter(|spec| !spec.name.is_empty())
        .collect::<Vec<_>>()
        .into()
}
