//! Declarative field rules.
//!
//! Covers the checks edit forms repeat everywhere: presence, non-blank text,
//! integer ranges, minimum collection sizes, length caps. Anything beyond
//! these belongs in a custom [`Validator`].

use crate::{FieldError, Record, ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// The field must be present.
    Required,
    /// The field must be present and hold a non-blank string or a non-empty
    /// array.
    NonEmpty,
    /// The field must be an integer within the inclusive range.
    IntRange { min: i64, max: i64 },
    /// The field must be an array with at least this many items.
    MinItems(usize),
    /// When present, the string value may not exceed this many characters.
    MaxLen(usize),
}

impl Rule {
    /// Checks the rule against a field value (`None` means absent) and
    /// returns the violation reason, if any.
    fn check(&self, value: Option<&Value>) -> Option<String> {
        match self {
            Rule::Required => value.is_none().then(|| "is required".to_string()),
            Rule::NonEmpty => match value {
                None => Some("cannot be empty".to_string()),
                Some(Value::String(s)) if s.trim().is_empty() => {
                    Some("cannot be empty".to_string())
                }
                Some(Value::Array(items)) if items.is_empty() => {
                    Some("cannot be empty".to_string())
                }
                Some(_) => None,
            },
            Rule::IntRange { min, max } => match value.and_then(Value::as_i64) {
                None => Some(format!("must be an integer between {min} and {max}")),
                Some(n) if n < *min || n > *max => Some(format!("must be between {min} and {max}")),
                Some(_) => None,
            },
            Rule::MinItems(wanted) => match value.and_then(Value::as_array) {
                None => Some(format!("needs at least {wanted} items")),
                Some(items) if items.len() < *wanted => {
                    Some(format!("needs at least {wanted} items"))
                }
                Some(_) => None,
            },
            Rule::MaxLen(cap) => match value {
                Some(Value::String(s)) if s.chars().count() > *cap => {
                    Some(format!("longer than {cap} characters"))
                }
                _ => None,
            },
        }
    }
}

/// Declarative validator assembled from per-field rules.
///
/// Rules run in insertion order and every violated rule contributes one
/// [`FieldError`], so a form can surface all problems at once.
///
/// # Example
///
/// ```
/// use editflow_model::{FieldRules, Record, Validator};
/// use serde_json::json;
///
/// let rules = FieldRules::new()
///     .non_empty("name")
///     .min_items("items", 2);
///
/// let draft = Record::new("menu")
///     .with_field("name", "Monday")
///     .with_field("items", json!(["Burger", "Fries"]));
/// assert!(rules.validate(&draft).is_valid());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    rules: Vec<(String, Rule)>,
}

impl FieldRules {
    /// Creates an empty rule set (accepts everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an arbitrary rule for a field.
    #[must_use]
    pub fn rule(mut self, field: impl Into<String>, rule: Rule) -> Self {
        self.rules.push((field.into(), rule));
        self
    }

    /// The field must be present.
    #[must_use]
    pub fn required(self, field: impl Into<String>) -> Self {
        self.rule(field, Rule::Required)
    }

    /// The field must be present and non-blank / non-empty.
    #[must_use]
    pub fn non_empty(self, field: impl Into<String>) -> Self {
        self.rule(field, Rule::NonEmpty)
    }

    /// The field must be an integer in `min..=max`.
    #[must_use]
    pub fn int_range(self, field: impl Into<String>, min: i64, max: i64) -> Self {
        self.rule(field, Rule::IntRange { min, max })
    }

    /// The field must be an array with at least `wanted` items.
    #[must_use]
    pub fn min_items(self, field: impl Into<String>, wanted: usize) -> Self {
        self.rule(field, Rule::MinItems(wanted))
    }

    /// When present, the field's string value is capped at `cap` characters.
    #[must_use]
    pub fn max_len(self, field: impl Into<String>, cap: usize) -> Self {
        self.rule(field, Rule::MaxLen(cap))
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Validator for FieldRules {
    fn validate(&self, draft: &Record) -> ValidationResult {
        let errors = self
            .rules
            .iter()
            .filter_map(|(field, rule)| {
                rule.check(draft.field(field))
                    .map(|reason| FieldError::new(field.as_str(), reason))
            })
            .collect();
        ValidationResult::from_errors(errors)
    }
}
