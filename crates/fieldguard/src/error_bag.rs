//! Ordered, field-tagged collection of validation failures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single failure message for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Field the failure belongs to
    pub field: String,
    /// Rule that failed (e.g. "required", "min")
    pub rule: String,
    /// Human-readable message
    pub message: String,
}

impl ErrorEntry {
    /// Create a new error entry.
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Failure messages in insertion order. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorBag {
    entries: Vec<ErrorEntry>,
}

impl ErrorBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn add(&mut self, entry: ErrorEntry) {
        self.entries.push(entry);
    }

    /// Remove every entry for a field, returning how many were dropped.
    pub fn remove(&mut self, field: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.field != field);
        before - self.entries.len()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All messages, flattened in insertion order.
    pub fn all(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    /// Messages for one field, in insertion order.
    pub fn collect(&self, field: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.clone())
            .collect()
    }

    /// First message recorded for a field.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Check whether a field has any failures.
    pub fn has(&self, field: &str) -> bool {
        self.entries.iter().any(|e| e.field == field)
    }

    /// Check whether any failure is recorded.
    pub fn any(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Same as `!any()`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// The raw entries.
    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }
}

impl Extend<ErrorEntry> for ErrorBag {
    fn extend<I: IntoIterator<Item = ErrorEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl fmt::Display for ErrorBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {} error(s)", self.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag() -> ErrorBag {
        let mut bag = ErrorBag::new();
        bag.add(ErrorEntry::new("email", "email", "The email must be a valid email."));
        bag.add(ErrorEntry::new("name", "required", "The name is required."));
        bag.add(ErrorEntry::new("name", "min", "The name must be at least 3 characters."));
        bag
    }

    #[test]
    fn all_preserves_insertion_order() {
        assert_eq!(
            bag().all(),
            vec![
                "The email must be a valid email.",
                "The name is required.",
                "The name must be at least 3 characters.",
            ]
        );
    }

    #[test]
    fn collect_and_first_are_field_scoped() {
        let bag = bag();
        assert_eq!(bag.collect("name").len(), 2);
        assert_eq!(bag.first("name"), Some("The name is required."));
        assert_eq!(bag.first("age"), None);
        assert!(bag.collect("age").is_empty());
    }

    #[test]
    fn remove_only_touches_one_field() {
        let mut bag = bag();
        assert_eq!(bag.remove("name"), 2);
        assert!(!bag.has("name"));
        assert!(bag.has("email"));
        assert_eq!(bag.count(), 1);
    }

    #[test]
    fn first_outlives_the_field_argument() {
        let bag = bag();
        let message = {
            let field = String::from("email");
            bag.first(&field)
        };
        assert_eq!(message, Some("The email must be a valid email."));
    }

    #[test]
    fn duplicates_are_kept() {
        let mut bag = ErrorBag::new();
        bag.add(ErrorEntry::new("a", "x", "same"));
        bag.add(ErrorEntry::new("a", "x", "same"));
        assert_eq!(bag.count(), 2);
    }

    #[test]
    fn clear_empties_bag() {
        let mut bag = bag();
        assert!(bag.any());
        bag.clear();
        assert!(bag.is_empty());
        assert_eq!(bag.to_string(), "Validation failed: 0 error(s)");
    }

    #[test]
    fn serializes_as_entry_list() {
        let json = serde_json::to_value(bag()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[0]["field"], "email");
        assert_eq!(json[1]["rule"], "required");
    }
}
