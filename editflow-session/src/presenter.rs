//! Presentation capability.

use async_trait::async_trait;

use editflow_model::{ChangeSummary, Record, Snapshot};

use crate::error::SessionError;

/// Outbound notification surface of a session.
///
/// A presenter is purely reactive: it renders what it is told and holds no
/// business logic, so a console form, a web view and a test recorder all
/// plug in the same way. `ask_confirmation` only delivers the prompt — the
/// operator's answer comes back through [`EditSession::confirm`].
///
/// Each session run produces exactly one terminal callback: `show_success`,
/// `show_cancelled` or `show_error`.
///
/// [`EditSession::confirm`]: crate::EditSession::confirm
#[async_trait]
pub trait Presenter: Send + Sync {
    /// A record was loaded; render the edit form.
    async fn show_form(&self, snapshot: &Snapshot);

    /// The draft validated cleanly; show the old-vs-new summary and solicit
    /// a yes/no answer.
    async fn ask_confirmation(&self, summary: &ChangeSummary);

    /// The edit was persisted. `record` carries the store-assigned version.
    async fn show_success(&self, record: &Record);

    /// The session ended in `Failed`.
    async fn show_error(&self, error: &SessionError);

    /// The session was cancelled and the original state kept.
    async fn show_cancelled(&self);
}
