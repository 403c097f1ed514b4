//! Store-level error taxonomy.
//!
//! Every store failure is exactly one of transient (worth retrying) or
//! permanent (retrying cannot succeed). The classification decides retry
//! versus rollback, which makes it the most consequential contract in the
//! whole workflow — a misclassified failure either hammers a broken write
//! or gives up on a recoverable one.

use crate::RecordId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by record stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing service could not be reached. Transient; expected to
    /// clear on retry. Implementations must map per-attempt timeouts here.
    #[error("store unavailable: {detail}")]
    Unavailable { detail: String },

    /// No record exists under the given id. Permanent.
    #[error("record not found: {0}")]
    NotFound(RecordId),

    /// The stored record changed (or disappeared) since it was loaded.
    /// Permanent — retrying the same stale write cannot succeed.
    #[error("conflict: {detail}")]
    Conflict { detail: String },
}

impl StoreError {
    /// Shorthand for a transient unavailability error.
    #[must_use]
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::Unavailable {
            detail: detail.into(),
        }
    }

    /// Shorthand for a conflict error.
    #[must_use]
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict {
            detail: detail.into(),
        }
    }

    /// Returns true if the failure is expected to clear on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
