//! Error types for the session layer.

use editflow_model::{AttemptLog, FieldError, RecordId};
use thiserror::Error;

use crate::state::SessionState;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by an edit session.
///
/// Only `ValidationFailed` is recoverable: the session stays alive in
/// `Editing` and the operator can fix the draft and resubmit. Every other
/// variant either leaves the session where it was (`InvalidTransition`,
/// failures during `start`) or ends it in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The draft was rejected before anything left the process.
    #[error("validation failed on {} field(s)", errors.len())]
    ValidationFailed { errors: Vec<FieldError> },

    /// The retry budget ran out while the store stayed unreachable. Carries
    /// the full attempt history of the operation that gave up.
    #[error("connection interrupted after {} attempt(s)", attempts.len())]
    ConnectionInterrupted { attempts: AttemptLog },

    /// The stored record changed underneath the session.
    #[error("conflicting edit: {detail}")]
    Conflict { detail: String },

    /// No record exists under the requested id.
    #[error("record {0} not found")]
    NotFound(RecordId),

    /// An operation was invoked in a state that does not accept it. The
    /// session is left untouched.
    #[error("cannot {operation} while {from}")]
    InvalidTransition {
        from: SessionState,
        operation: &'static str,
    },
}

impl SessionError {
    /// True when the operator can fix the problem and resubmit on the same
    /// session.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ValidationFailed { .. })
    }

    /// Field-level detail for validation failures, empty otherwise.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::ValidationFailed { errors } => errors,
            _ => &[],
        }
    }

    /// Attempt history for connection failures, `None` otherwise.
    #[must_use]
    pub fn attempts(&self) -> Option<&AttemptLog> {
        match self {
            Self::ConnectionInterrupted { attempts } => Some(attempts),
            _ => None,
        }
    }
}
