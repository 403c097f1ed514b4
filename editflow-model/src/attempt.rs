//! Per-attempt diagnostics for guarded store operations.
//!
//! Each persistence attempt leaves an [`AttemptRecord`]; a session collects
//! them in an append-only [`AttemptLog`]. The log both enforces the retry
//! budget (its length can never exceed the configured maximum) and explains
//! afterwards what the connection did.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before Unix epoch")
        .as_millis() as u64
}

/// Outcome of a single attempt against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail")]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The operation succeeded.
    Success,
    /// A connection-level failure; the guard may retry.
    TransientFailure(String),
    /// A data-level failure; the guard gives up immediately.
    PermanentFailure(String),
}

/// One attempt against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based position within the guarded operation.
    pub seq: u32,
    /// Wall-clock time of the attempt (milliseconds since Unix epoch).
    pub at: u64,
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    /// Records an attempt outcome at the current time.
    #[must_use]
    pub fn new(seq: u32, outcome: AttemptOutcome) -> Self {
        Self {
            seq,
            at: now_millis(),
            outcome,
        }
    }

    /// Returns true if this attempt succeeded.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success)
    }
}

/// Append-only log of attempts, scoped to one edit session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptLog {
    records: Vec<AttemptRecord>,
}

impl AttemptLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attempt. Records are never removed or reordered.
    pub fn push(&mut self, record: AttemptRecord) {
        self.records.push(record);
    }

    /// Number of recorded attempts.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing was attempted yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All recorded attempts, oldest first.
    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    /// The most recent attempt, if any.
    pub fn last(&self) -> Option<&AttemptRecord> {
        self.records.last()
    }
}
