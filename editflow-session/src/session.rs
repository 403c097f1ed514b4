//! The edit session state machine.

use std::sync::Arc;

use tracing::{debug, info, warn};

use editflow_model::{
    AttemptLog, ChangeSummary, FieldChange, Record, RecordId, Snapshot, StoreError,
    ValidationResult, Validator,
};

use crate::cancel::CancelHandle;
use crate::error::{SessionError, SessionResult};
use crate::guard::{ConnectionGuard, ConnectionState, GuardError, RetryPolicy};
use crate::presenter::Presenter;
use crate::state::SessionState;
use crate::store::RecordStore;

/// Terminal result of a session that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The edit was persisted; carries the record as the store now holds it.
    Committed(Record),
    /// The edit was abandoned and the original state kept.
    RolledBack,
}

/// One operator interaction editing one record.
///
/// A session wires three capabilities together — a [`RecordStore`], a
/// [`Validator`] and a [`Presenter`] — and walks the draft through
/// load, edit, validate, confirm and persist. The snapshot taken at load
/// time is the rollback target: nothing before `confirm(true)` touches the
/// store, so every abandoned path leaves the stored record exactly as it
/// was.
///
/// ```text
/// Idle -> Loaded -> Editing -> Validating -> AwaitingConfirmation -> Persisting -> Committed
///                       ^           |                   |                |-> RolledBack
///                       '-----------'                   '-> RolledBack   '-> Failed
/// ```
///
/// Store calls run behind a [`ConnectionGuard`]; transient outages are
/// retried within the configured [`RetryPolicy`] and every try is recorded.
/// Sessions are single-operator by design — concurrency between sessions is
/// the store's problem, resolved through record versions.
pub struct EditSession {
    store: Arc<dyn RecordStore>,
    validator: Arc<dyn Validator>,
    presenter: Arc<dyn Presenter>,
    guard: ConnectionGuard,
    cancel: CancelHandle,
    state: SessionState,
    snapshot: Option<Snapshot>,
    draft: Option<Record>,
    attempts: AttemptLog,
}

impl EditSession {
    /// Creates an idle session with the default retry policy.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        validator: Arc<dyn Validator>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self::with_policy(store, validator, presenter, RetryPolicy::default())
    }

    /// Creates an idle session with an explicit retry policy.
    #[must_use]
    pub fn with_policy(
        store: Arc<dyn RecordStore>,
        validator: Arc<dyn Validator>,
        presenter: Arc<dyn Presenter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            validator,
            presenter,
            guard: ConnectionGuard::new(policy),
            cancel: CancelHandle::new(),
            state: SessionState::Idle,
            snapshot: None,
            draft: None,
            attempts: AttemptLog::new(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The record under edit, once a load succeeded.
    #[must_use]
    pub fn record_id(&self) -> Option<RecordId> {
        self.snapshot.as_ref().map(Snapshot::id)
    }

    /// The rollback target. Survives into terminal states for inspection.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// The working copy. `None` before load and in terminal states.
    #[must_use]
    pub fn draft(&self) -> Option<&Record> {
        self.draft.as_ref()
    }

    /// Attempt history of the persistence phase.
    #[must_use]
    pub fn attempts(&self) -> &AttemptLog {
        &self.attempts
    }

    /// Link health as last observed by the retry guard.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.guard.state()
    }

    /// A cloneable handle for cancelling from another task. This is the only
    /// way to cancel once `confirm(true)` is running; the flag is honored
    /// between persistence attempts.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    // ── Operations ─────────────────────────────────────────────────────

    /// Loads the record and opens the edit form.
    ///
    /// Runs under the retry guard with a fresh budget. On success the
    /// session holds a snapshot plus a working copy and sits in `Loaded`.
    /// If the load is cancelled between retries the session ends in
    /// `RolledBack` (nothing was modified); on failure it stays `Idle` so
    /// the caller may try again, with the attempt history carried inside
    /// the error.
    pub async fn start(&mut self, id: RecordId) -> SessionResult<SessionState> {
        self.expect(&[SessionState::Idle], "start")?;
        let store = Arc::clone(&self.store);
        let cancel = self.cancel.clone();
        let mut log = AttemptLog::new();
        let loaded = self
            .guard
            .attempt(&mut log, &cancel, || {
                let store = Arc::clone(&store);
                async move { store.load(id).await }
            })
            .await;
        match loaded {
            Ok(snapshot) => {
                info!(
                    "Loaded {} {} at version {}",
                    snapshot.record().record_type,
                    snapshot.id(),
                    snapshot.version()
                );
                self.draft = Some(snapshot.to_draft());
                self.state = SessionState::Loaded;
                self.presenter.show_form(&snapshot).await;
                self.snapshot = Some(snapshot);
                Ok(self.state)
            }
            Err(GuardError::Cancelled) => {
                info!("Load of {id} cancelled before completion");
                self.roll_back().await;
                Ok(self.state)
            }
            Err(GuardError::Interrupted) => {
                warn!("Giving up loading {id}: retry budget exhausted");
                Err(SessionError::ConnectionInterrupted { attempts: log })
            }
            Err(GuardError::Permanent(err)) => {
                warn!("Load of {id} failed: {err}");
                Err(Self::permanent_error(err, &log))
            }
        }
    }

    /// Applies field changes to the draft and marks the session dirty.
    ///
    /// Purely local: the store is not contacted and the snapshot is never
    /// touched. An empty slice still moves `Loaded` to `Editing`; further
    /// applies stay in `Editing` without re-entering it.
    pub fn apply(&mut self, changes: &[FieldChange]) -> SessionResult<()> {
        self.expect(&[SessionState::Loaded, SessionState::Editing], "apply")?;
        let draft = self.draft_mut();
        for change in changes {
            draft.set_field(change.field.clone(), change.value.clone());
        }
        debug!("Applied {} change(s) to draft", changes.len());
        if self.state == SessionState::Loaded {
            self.state = SessionState::Editing;
        }
        Ok(())
    }

    /// Validates the draft and, if it passes, asks for confirmation.
    ///
    /// On success the presenter has been shown the old-versus-new summary
    /// (also returned) and the session waits in `AwaitingConfirmation` for
    /// [`confirm`](Self::confirm). On rejection the session returns to
    /// `Editing` with the draft intact and the field errors in the error —
    /// fix and resubmit.
    pub async fn submit(&mut self) -> SessionResult<ChangeSummary> {
        self.expect(&[SessionState::Editing], "submit")?;
        self.state = SessionState::Validating;
        let verdict = self.validator.validate(self.draft_ref());
        if let ValidationResult::Invalid(errors) = verdict {
            debug!("Validation rejected draft on {} field(s)", errors.len());
            self.state = SessionState::Editing;
            return Err(SessionError::ValidationFailed { errors });
        }
        let summary = ChangeSummary::between(self.snapshot_ref().record(), self.draft_ref());
        info!(
            "Draft for {} validated, {} field(s) changed",
            summary.record_id,
            summary.len()
        );
        self.state = SessionState::AwaitingConfirmation;
        self.presenter.ask_confirmation(&summary).await;
        Ok(summary)
    }

    /// Delivers the operator's answer to the confirmation prompt.
    ///
    /// `false` rolls the session back without any store contact. `true`
    /// enters `Persisting` and writes the draft under the retry guard:
    ///
    /// * success commits, with the store-assigned version on the returned
    ///   record;
    /// * an exhausted retry budget or a permanent store failure ends the
    ///   session in `Failed`;
    /// * cancellation observed between attempts rolls back — but an
    ///   in-flight attempt always resolves first, and if it succeeded the
    ///   commit wins.
    pub async fn confirm(&mut self, accepted: bool) -> SessionResult<Outcome> {
        self.expect(&[SessionState::AwaitingConfirmation], "confirm")?;
        if !accepted {
            info!("Edit declined at confirmation");
            return Ok(self.roll_back().await);
        }

        self.state = SessionState::Persisting;
        let store = Arc::clone(&self.store);
        let cancel = self.cancel.clone();
        let draft = self.draft_ref().clone();
        info!(
            "Persisting {} {} (base version {})",
            draft.record_type, draft.id, draft.version
        );
        let persisted = self
            .guard
            .attempt(&mut self.attempts, &cancel, || {
                let store = Arc::clone(&store);
                let draft = draft.clone();
                async move { store.persist(&draft).await }
            })
            .await;

        match persisted {
            Ok(version) => {
                let mut record = self.take_draft();
                record.version = version;
                self.state = SessionState::Committed;
                info!("Committed {} at version {}", record.id, version);
                self.presenter.show_success(&record).await;
                Ok(Outcome::Committed(record))
            }
            Err(GuardError::Cancelled) => {
                info!("Persist cancelled between attempts");
                Ok(self.roll_back().await)
            }
            Err(GuardError::Interrupted) => {
                let error = SessionError::ConnectionInterrupted {
                    attempts: self.attempts.clone(),
                };
                self.fail(&error).await;
                Err(error)
            }
            Err(GuardError::Permanent(err)) => {
                let error = Self::permanent_error(err, &self.attempts);
                self.fail(&error).await;
                Err(error)
            }
        }
    }

    /// Abandons the edit and restores nothing — nothing was written.
    ///
    /// Valid in every pre-persist state, including `Idle`. While a persist
    /// is running this method cannot be reached (the session is borrowed);
    /// use the [`cancel_handle`](Self::cancel_handle) instead.
    pub async fn cancel(&mut self) -> SessionResult<()> {
        self.expect(
            &[
                SessionState::Idle,
                SessionState::Loaded,
                SessionState::Editing,
                SessionState::AwaitingConfirmation,
            ],
            "cancel",
        )?;
        self.cancel.cancel();
        info!("Session cancelled while {}", self.state);
        self.roll_back().await;
        Ok(())
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn expect(&self, allowed: &[SessionState], operation: &'static str) -> SessionResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.state,
                operation,
            })
        }
    }

    async fn roll_back(&mut self) -> Outcome {
        self.draft = None;
        self.state = SessionState::RolledBack;
        self.presenter.show_cancelled().await;
        Outcome::RolledBack
    }

    async fn fail(&mut self, error: &SessionError) {
        warn!("Session failed: {error}");
        self.draft = None;
        self.state = SessionState::Failed;
        self.presenter.show_error(error).await;
    }

    fn permanent_error(err: StoreError, attempts: &AttemptLog) -> SessionError {
        match err {
            StoreError::NotFound(id) => SessionError::NotFound(id),
            StoreError::Conflict { detail } => SessionError::Conflict { detail },
            StoreError::Unavailable { .. } => SessionError::ConnectionInterrupted {
                attempts: attempts.clone(),
            },
        }
    }

    // The machine guarantees snapshot and draft exist in every state where
    // the methods below run; `expect` checks state first.

    fn draft_ref(&self) -> &Record {
        self.draft.as_ref().expect("draft present in active states")
    }

    fn draft_mut(&mut self) -> &mut Record {
        self.draft.as_mut().expect("draft present in active states")
    }

    fn take_draft(&mut self) -> Record {
        self.draft.take().expect("draft present in active states")
    }

    fn snapshot_ref(&self) -> &Snapshot {
        self.snapshot
            .as_ref()
            .expect("snapshot present from load onwards")
    }
}
