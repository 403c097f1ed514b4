use crate::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Outcome of validating a draft.
///
/// Stateless — derived fresh on every submission, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationResult {
    /// The draft may proceed to confirmation.
    Valid,
    /// The draft was rejected with one reason per violated field rule.
    Invalid(Vec<FieldError>),
}

impl ValidationResult {
    /// Builds a result from collected errors; no errors means valid.
    #[must_use]
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        if errors.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(errors)
        }
    }

    /// Returns true if the draft passed.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The field errors; empty when valid.
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::Valid => &[],
            Self::Invalid(errors) => errors,
        }
    }
}

/// Client-side validation capability, supplied per use case.
///
/// Implementations must be pure (no I/O, no mutation) and deterministic for
/// a given draft: the session may evaluate the same draft any number of
/// times without side effects.
pub trait Validator: Send + Sync {
    /// Judges a draft. Field semantics are entirely the implementor's.
    fn validate(&self, draft: &Record) -> ValidationResult;
}

/// Accepts every draft. The default when a use case has no client-side rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn validate(&self, _draft: &Record) -> ValidationResult {
        ValidationResult::Valid
    }
}

impl<F> Validator for F
where
    F: Fn(&Record) -> ValidationResult + Send + Sync,
{
    fn validate(&self, draft: &Record) -> ValidationResult {
        self(draft)
    }
}
