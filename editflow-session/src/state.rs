//! Session lifecycle states and the legal transitions between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of an edit session.
///
/// The session moves strictly forward along this machine; terminal states
/// absorb. `Validating` is only observable from inside `submit` — by the
/// time the call returns the session is back in `Editing` or has advanced
/// to `AwaitingConfirmation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, nothing loaded yet.
    Idle,
    /// A snapshot was taken and the working copy exists.
    Loaded,
    /// The working copy has diverged (or may diverge) from the snapshot.
    Editing,
    /// The draft is being checked against the validation rules.
    Validating,
    /// Validation passed; waiting for the operator's yes/no.
    AwaitingConfirmation,
    /// The confirmed draft is being written, possibly across retries.
    Persisting,
    /// The store accepted the edit. Terminal.
    Committed,
    /// The edit was abandoned and the original state kept. Terminal.
    RolledBack,
    /// The edit could not be completed. Terminal.
    Failed,
}

impl SessionState {
    /// States reachable from `self` in a single step.
    #[must_use]
    pub fn next_states(self) -> &'static [SessionState] {
        use SessionState::*;
        match self {
            Idle => &[Loaded, RolledBack],
            Loaded => &[Editing, RolledBack],
            Editing => &[Validating, RolledBack],
            Validating => &[AwaitingConfirmation, Editing],
            AwaitingConfirmation => &[Persisting, RolledBack],
            Persisting => &[Committed, RolledBack, Failed],
            Committed | RolledBack | Failed => &[],
        }
    }

    /// Returns true if stepping from `self` to `to` is legal.
    #[must_use]
    pub fn can_transition(self, to: SessionState) -> bool {
        self.next_states().contains(&to)
    }

    /// Terminal states accept no further operations.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack | Self::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Editing => "editing",
            Self::Validating => "validating",
            Self::AwaitingConfirmation => "awaiting confirmation",
            Self::Persisting => "persisting",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}
