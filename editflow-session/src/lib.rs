//! Resilient transactional edit workflow.
//!
//! This crate drives the load → edit → validate → confirm → persist loop
//! for a single record, against a store that may fail or disappear at any
//! point:
//!
//! - [`EditSession`] — the state machine; one instance per operator
//!   interaction
//! - [`ConnectionGuard`] / [`RetryPolicy`] — bounded exponential backoff
//!   with jitter around every store call
//! - [`RecordStore`] / [`Presenter`] — the capability seams a host
//!   application implements; validation plugs in through
//!   [`editflow_model::Validator`]
//! - [`CancelHandle`] — cooperative cancellation that never abandons an
//!   in-flight write
//!
//! Nothing is written before the operator confirms, and a session that does
//! not commit leaves the stored record untouched. Each session's retry loop
//! is an ordinary future: drive many of them on separate tasks and a
//! stalled connection in one never starves another.

mod cancel;
mod error;
mod guard;
mod presenter;
mod session;
mod state;
mod store;

pub use cancel::CancelHandle;
pub use error::{SessionError, SessionResult};
pub use guard::{ConnectionGuard, ConnectionState, GuardError, RetryPolicy};
pub use presenter::Presenter;
pub use session::{EditSession, Outcome};
pub use state::SessionState;
pub use store::RecordStore;
