//! Bounded retry around store calls.
//!
//! The [`ConnectionGuard`] owns everything about transient failure handling:
//! how many attempts a single logical operation gets, how long to wait
//! between them, and what the link looked like last time anyone asked.
//! Callers hand it a closure producing the store future and get back either
//! the value or a [`GuardError`] explaining why the loop stopped.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use editflow_model::{AttemptLog, AttemptOutcome, AttemptRecord, StoreError, StoreResult};

use crate::cancel::CancelHandle;

/// Health of the remote link as last observed by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// The last store call was answered (nothing attempted counts as up).
    Up,
    /// The last store call failed transiently.
    Down,
    /// A retry is scheduled; the link is about to be re-tested.
    Probing,
}

/// Retry budget and backoff shape for guarded operations.
///
/// Delays grow exponentially from `base_delay`, capped at `max_delay`, with
/// uniform jitter added on top so simultaneous sessions do not hammer a
/// recovering store in lockstep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed per operation, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on the exponential component.
    pub max_delay: Duration,
    /// Width of the jitter window as a fraction of `base_delay`, in `[0, 1]`.
    pub jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            jitter_fraction: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Policy with no jitter. Delays become fully deterministic, which is
    /// what tests and single-writer batch jobs want.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter_fraction = 0.0;
        self
    }

    /// Clamps the policy into its documented domain: at least one attempt,
    /// jitter fraction within `[0, 1]`, `max_delay >= base_delay`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_attempts = self.max_attempts.max(1);
        if !self.jitter_fraction.is_finite() {
            self.jitter_fraction = 0.0;
        }
        self.jitter_fraction = self.jitter_fraction.clamp(0.0, 1.0);
        if self.max_delay < self.base_delay {
            self.max_delay = self.base_delay;
        }
        self
    }

    /// Exponential backoff after `attempt` failed tries:
    /// `min(base_delay * 2^(attempt-1), max_delay)`.
    ///
    /// Pure, so the growth curve can be checked without a clock.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
        let millis = (self.base_delay.as_millis().min(u128::from(u64::MAX)) as u64)
            .saturating_mul(factor);
        Duration::from_millis(millis).min(self.max_delay)
    }

    /// Jitter derived from caller-supplied randomness: uniform in
    /// `[0, base_delay * jitter_fraction)`.
    #[must_use]
    pub fn jitter_from(&self, random: u64) -> Duration {
        let window = (self.base_delay.as_millis() as f64 * self.jitter_fraction) as u64;
        if window == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(random % window)
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff(attempt) + self.jitter_from(rand::random())
    }
}

/// Why a guarded operation stopped without a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// Transient failures used up the whole retry budget.
    #[error("retry budget exhausted")]
    Interrupted,
    /// The store reported a failure retrying cannot fix.
    #[error(transparent)]
    Permanent(StoreError),
    /// Cancellation was observed between attempts.
    #[error("cancelled between attempts")]
    Cancelled,
}

/// Serializes access to an unreliable store behind a retry loop.
///
/// One guard instance belongs to one session; it is not shared. All it keeps
/// between operations is the policy and the last observed
/// [`ConnectionState`].
#[derive(Debug)]
pub struct ConnectionGuard {
    policy: RetryPolicy,
    state: ConnectionState,
}

impl ConnectionGuard {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: policy.normalized(),
            state: ConnectionState::Up,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_up(&self) -> bool {
        self.state == ConnectionState::Up
    }

    /// Runs `op` under the retry budget.
    ///
    /// Every try appends one [`AttemptRecord`] to `log`, numbered from 1
    /// within this operation. Transient errors (`StoreError::is_transient`)
    /// burn budget and trigger backoff; permanent ones surface immediately
    /// with budget left unspent. `cancel` is consulted before every dispatch
    /// and again when a failed attempt resolves, never mid-flight: a future
    /// already in the air resolves and gets its record, but once the flag is
    /// up no new attempt goes out, even when it was raised during a backoff
    /// sleep.
    pub async fn attempt<T, F, Fut>(
        &mut self,
        log: &mut AttemptLog,
        cancel: &CancelHandle,
        mut op: F,
    ) -> Result<T, GuardError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let max = self.policy.max_attempts;
        let mut attempt: u32 = 1;
        loop {
            // Covers both the first dispatch and the wake-up from a backoff
            // sleep: no attempt starts once the flag is up.
            if cancel.is_cancelled() {
                debug!("cancellation observed before attempt {attempt}, stopping");
                return Err(GuardError::Cancelled);
            }
            match op().await {
                Ok(value) => {
                    log.push(AttemptRecord::new(attempt, AttemptOutcome::Success));
                    self.state = ConnectionState::Up;
                    debug!("attempt {attempt}/{max} succeeded");
                    return Ok(value);
                }
                Err(err) if err.is_transient() => {
                    log.push(AttemptRecord::new(
                        attempt,
                        AttemptOutcome::TransientFailure(err.to_string()),
                    ));
                    self.state = ConnectionState::Down;
                    warn!("attempt {attempt}/{max} failed transiently: {err}");
                    if attempt >= max {
                        return Err(GuardError::Interrupted);
                    }
                    if cancel.is_cancelled() {
                        debug!("cancellation observed after attempt {attempt}, stopping retries");
                        return Err(GuardError::Cancelled);
                    }
                    let delay = self.policy.delay_after(attempt);
                    debug!("backing off {delay:?} before attempt {}", attempt + 1);
                    self.state = ConnectionState::Probing;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    log.push(AttemptRecord::new(
                        attempt,
                        AttemptOutcome::PermanentFailure(err.to_string()),
                    ));
                    // The store answered, so the link itself is fine.
                    self.state = ConnectionState::Up;
                    warn!("attempt {attempt}/{max} failed permanently: {err}");
                    return Err(GuardError::Permanent(err));
                }
            }
        }
    }
}

impl Default for ConnectionGuard {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
