//! Built-in validators and their English messages.
//!
//! Every registry is seeded from here. Messages live in the `en` locale of
//! the dictionary so translations can be merged leaf by leaf.

mod builtin;

use crate::definition::RuleOutcome;
use crate::message::{Dictionary, DEFAULT_LOCALE};
use serde_json::Value;

type Builtin = fn(&Value, &[String]) -> RuleOutcome;

/// Name and predicate of every built-in validator.
pub(crate) const BUILTINS: &[(&str, Builtin)] = &[
    ("required", builtin::required),
    ("email", builtin::email),
    ("url", builtin::url),
    ("min", builtin::min),
    ("max", builtin::max),
    ("between", builtin::between),
    ("alpha", builtin::alpha),
    ("alpha_num", builtin::alpha_num),
    ("alpha_dash", builtin::alpha_dash),
    ("numeric", builtin::numeric),
    ("digits", builtin::digits),
    ("in", builtin::one_of),
    ("not_in", builtin::not_one_of),
    ("regex", builtin::pattern),
];

fn arg(params: &[String], index: usize) -> &str {
    params.get(index).map(String::as_str).unwrap_or_default()
}

/// English messages for the built-in validators.
pub fn english() -> Dictionary {
    let mut dict = Dictionary::new();
    let en = DEFAULT_LOCALE;
    dict.insert(en, "required", |f, _| format!("The {f} is required."));
    dict.insert(en, "email", |f, _| format!("The {f} must be a valid email."));
    dict.insert(en, "url", |f, _| format!("The {f} is not a valid URL."));
    dict.insert(en, "min", |f, p| {
        format!("The {f} must be at least {} characters.", arg(p, 0))
    });
    dict.insert(en, "max", |f, p| {
        format!("The {f} may not be greater than {} characters.", arg(p, 0))
    });
    dict.insert(en, "between", |f, p| {
        format!("The {f} must be between {} and {}.", arg(p, 0), arg(p, 1))
    });
    dict.insert(en, "alpha", |f, _| {
        format!("The {f} may only contain alphabetic characters.")
    });
    dict.insert(en, "alpha_num", |f, _| {
        format!("The {f} may only contain alpha-numeric characters.")
    });
    dict.insert(en, "alpha_dash", |f, _| {
        format!("The {f} may contain alpha-numeric characters as well as dashes and underscores.")
    });
    dict.insert(en, "numeric", |f, _| {
        format!("The {f} may only contain numeric characters.")
    });
    dict.insert(en, "digits", |f, p| {
        format!("The {f} must be numeric and exactly contain {} digits.", arg(p, 0))
    });
    dict.insert(en, "in", |f, _| format!("The {f} must be a valid value."));
    dict.insert(en, "not_in", |f, _| format!("The {f} must be a valid value."));
    dict.insert(en, "regex", |f, _| format!("The {f} format is invalid."));
    dict
}
