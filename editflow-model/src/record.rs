use crate::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A generic domain record under edit.
///
/// Every use case (menus, banners, delays, bookmarks, ...) flows through this
/// type. `fields` holds arbitrary JSON whose structure is defined by the
/// caller; the workflow core never interprets it beyond field-level diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Caller-defined tag (e.g. "menu", "banner", "delay").
    pub record_type: String,
    /// The mutable payload: a flat JSON object keyed by field name.
    pub fields: Map<String, Value>,
    /// Optimistic-concurrency token. Owned by the store, bumped on every
    /// successful persist; zero for records that were never persisted.
    #[serde(default)]
    pub version: u64,
}

impl Record {
    /// Creates an empty record of the given type with a fresh id.
    #[must_use]
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            record_type: record_type.into(),
            fields: Map::new(),
            version: 0,
        }
    }

    /// Sets a field, builder-style.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Returns a field value, if present.
    pub fn field(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field as a string slice.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }

    /// Returns a field as a signed integer.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(|v| v.as_i64())
    }

    /// Returns a field as an array.
    pub fn get_array(&self, field: &str) -> Option<&Vec<Value>> {
        self.fields.get(field).and_then(|v| v.as_array())
    }

    /// Assigns a field value. `Value::Null` removes the field, matching the
    /// edit-form convention that clearing an input unsets the stored value.
    pub fn set_field(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if value.is_null() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
    }

    /// Returns true if the payload carries no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Immutable copy of a record taken at load time — the rollback target.
///
/// A snapshot is created once per edit session and never mutated afterwards;
/// drafts are cloned out of it and discarded back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    record: Record,
}

impl Snapshot {
    /// Wraps a freshly loaded record.
    #[must_use]
    pub fn new(record: Record) -> Self {
        Self { record }
    }

    /// Read access to the captured record.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// The captured record's id.
    pub fn id(&self) -> RecordId {
        self.record.id
    }

    /// The version the record carried when it was loaded.
    pub fn version(&self) -> u64 {
        self.record.version
    }

    /// Clones out a mutable working copy.
    #[must_use]
    pub fn to_draft(&self) -> Record {
        self.record.clone()
    }

    /// Unwraps the captured record.
    #[must_use]
    pub fn into_record(self) -> Record {
        self.record
    }
}
