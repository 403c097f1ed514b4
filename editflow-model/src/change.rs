//! Draft edits and confirmation diffs.
//!
//! `FieldChange` is the unit of editing: one assignment onto the draft.
//! `ChangeSummary` is the old-versus-new view a presenter shows when asking
//! the operator to confirm, computed fresh from snapshot and draft.

use crate::{Record, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// One field assignment applied to a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    /// The new value. `Value::Null` clears the field.
    pub value: Value,
}

impl FieldChange {
    /// Assigns `value` to `field`.
    #[must_use]
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Clears `field`.
    #[must_use]
    pub fn clear(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: Value::Null,
        }
    }
}

/// One changed field in a confirmation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    /// Value before the edit; `None` when the field was absent.
    pub before: Option<Value>,
    /// Value after the edit; `None` when the edit removes the field.
    pub after: Option<Value>,
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unset = Value::String("(unset)".to_string());
        let before = self.before.as_ref().unwrap_or(&unset);
        let after = self.after.as_ref().unwrap_or(&unset);
        write!(f, "{}: {} -> {}", self.field, before, after)
    }
}

/// The old-versus-new summary shown when asking for confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub record_id: RecordId,
    pub record_type: String,
    /// Changed fields, ordered by field name.
    pub changes: Vec<FieldDiff>,
}

impl ChangeSummary {
    /// Computes the field-level diff between a snapshot and its draft.
    ///
    /// Fields present in either side are compared; unchanged fields are
    /// omitted. The result is ordered by field name so two computations over
    /// the same pair are identical.
    #[must_use]
    pub fn between(snapshot: &Record, draft: &Record) -> Self {
        let names: BTreeSet<&String> = snapshot.fields.keys().chain(draft.fields.keys()).collect();

        let changes = names
            .into_iter()
            .filter_map(|name| {
                let before = snapshot.fields.get(name);
                let after = draft.fields.get(name);
                if before == after {
                    None
                } else {
                    Some(FieldDiff {
                        field: name.clone(),
                        before: before.cloned(),
                        after: after.cloned(),
                    })
                }
            })
            .collect();

        Self {
            record_id: draft.id,
            record_type: draft.record_type.clone(),
            changes,
        }
    }

    /// Returns true when the draft is identical to the snapshot.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changed fields.
    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.record_type, self.record_id)?;
        for diff in &self.changes {
            write!(f, "\n  {diff}")?;
        }
        Ok(())
    }
}
