//! Built-in predicates.
//!
//! Every predicate takes the raw JSON value and the raw string parameters of
//! its rule. Parameters that fail to parse make the rule fail.

use crate::definition::RuleOutcome;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

// Pre-compiled regex patterns
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();

// `regex:` rule patterns by source; `None` marks a pattern that failed to compile
static PATTERNS: OnceLock<RwLock<HashMap<String, Option<Regex>>>> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        // RFC 5322 local part, dotted host with an alphabetic TLD of 2+ chars
        Regex::new(concat!(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@",
            r"(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$",
        ))
        .expect("email regex is valid")
    })
}

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"^(https?|ftp)://[^\s/$.?#].[^\s]*$").expect("url regex is valid")
    })
}

fn compiled(source: &str) -> Option<Regex> {
    let patterns = PATTERNS.get_or_init(Default::default);
    if let Some(cached) = patterns
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(source)
    {
        return cached.clone();
    }
    let regex = match Regex::new(source) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern = %source, error = %e, "regex rule has an invalid pattern");
            None
        }
    };
    patterns
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(source.to_string(), regex.clone());
    regex
}

/// Scalar values as text; `None` for null, arrays and objects.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Character count for text, element count for arrays.
fn size_of(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        other => as_text(other).map(|s| s.chars().count()),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn param<T: std::str::FromStr>(params: &[String], index: usize) -> Option<T> {
    params.get(index).and_then(|p| p.parse().ok())
}

fn text_matches(value: &Value, pred: impl Fn(char) -> bool) -> bool {
    as_text(value).is_some_and(|s| s.chars().all(pred))
}

pub(crate) fn required(value: &Value, _: &[String]) -> RuleOutcome {
    let present = match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    };
    present.into()
}

pub(crate) fn email(value: &Value, _: &[String]) -> RuleOutcome {
    as_text(value)
        .is_some_and(|s| email_regex().is_match(&s))
        .into()
}

pub(crate) fn url(value: &Value, _: &[String]) -> RuleOutcome {
    as_text(value)
        .is_some_and(|s| url_regex().is_match(&s))
        .into()
}

pub(crate) fn min(value: &Value, params: &[String]) -> RuleOutcome {
    match (size_of(value), param::<usize>(params, 0)) {
        (Some(len), Some(min)) => (len >= min).into(),
        _ => false.into(),
    }
}

pub(crate) fn max(value: &Value, params: &[String]) -> RuleOutcome {
    let Some(max) = param::<usize>(params, 0) else {
        return false.into();
    };
    match value {
        Value::Null => true.into(),
        other => size_of(other).is_some_and(|len| len <= max).into(),
    }
}

pub(crate) fn between(value: &Value, params: &[String]) -> RuleOutcome {
    match (
        as_number(value),
        param::<f64>(params, 0),
        param::<f64>(params, 1),
    ) {
        (Some(n), Some(lo), Some(hi)) => (lo <= n && n <= hi).into(),
        _ => false.into(),
    }
}

pub(crate) fn alpha(value: &Value, _: &[String]) -> RuleOutcome {
    text_matches(value, char::is_alphabetic).into()
}

pub(crate) fn alpha_num(value: &Value, _: &[String]) -> RuleOutcome {
    text_matches(value, char::is_alphanumeric).into()
}

pub(crate) fn alpha_dash(value: &Value, _: &[String]) -> RuleOutcome {
    text_matches(value, |c| c.is_alphanumeric() || c == '-' || c == '_').into()
}

pub(crate) fn numeric(value: &Value, _: &[String]) -> RuleOutcome {
    text_matches(value, |c| c.is_ascii_digit()).into()
}

pub(crate) fn digits(value: &Value, params: &[String]) -> RuleOutcome {
    let Some(length) = param::<usize>(params, 0) else {
        return false.into();
    };
    as_text(value)
        .is_some_and(|s| s.len() == length && s.chars().all(|c| c.is_ascii_digit()))
        .into()
}

pub(crate) fn one_of(value: &Value, params: &[String]) -> RuleOutcome {
    as_text(value)
        .is_some_and(|s| params.iter().any(|p| *p == s))
        .into()
}

pub(crate) fn not_one_of(value: &Value, params: &[String]) -> RuleOutcome {
    match as_text(value) {
        Some(s) => (!params.iter().any(|p| *p == s)).into(),
        None => true.into(),
    }
}

pub(crate) fn pattern(value: &Value, params: &[String]) -> RuleOutcome {
    let Some(source) = params.first() else {
        return false.into();
    };
    match compiled(source) {
        Some(re) => as_text(value).is_some_and(|s| re.is_match(&s)).into(),
        None => false.into(),
    }
}
