//! Record model and validation vocabulary for the edit workflow.
//!
//! Defines the caller-facing types every subsystem shares:
//! - [`Record`] — the generic data container (id, type, JSON fields, version)
//! - [`Snapshot`] — the immutable pre-edit copy used as the rollback target
//! - [`FieldChange`] / [`ChangeSummary`] — draft edits and the old-vs-new
//!   diff shown at confirmation
//! - [`Validator`] / [`FieldRules`] — the client-side validation capability
//! - [`StoreError`] — transient/permanent classification of store failures
//! - [`AttemptRecord`] / [`AttemptLog`] — per-attempt persistence diagnostics
//!
//! The business rules of any one use case (menu contents, banner text, delay
//! ranges, ...) stay with the caller; these types only carry them.

mod attempt;
mod change;
mod error;
mod ids;
mod record;
mod rules;
mod validation;

pub use attempt::{AttemptLog, AttemptOutcome, AttemptRecord};
pub use change::{ChangeSummary, FieldChange, FieldDiff};
pub use error::{StoreError, StoreResult};
pub use ids::RecordId;
pub use record::{Record, Snapshot};
pub use rules::{FieldRules, Rule};
pub use validation::{AcceptAll, FieldError, ValidationResult, Validator};
