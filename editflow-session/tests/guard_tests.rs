use std::collections::VecDeque;
use std::time::Duration;

use editflow_model::{AttemptLog, AttemptOutcome, StoreError, StoreResult};
use editflow_session::{CancelHandle, ConnectionGuard, ConnectionState, GuardError, RetryPolicy};

fn make_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(5),
        jitter_fraction: 0.0,
    }
}

fn outage() -> StoreError {
    StoreError::unavailable("no route to host")
}

// ── RetryPolicy ───────────────────────────────────────────────────

#[test]
fn default_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.base_delay, Duration::from_millis(100));
    assert_eq!(policy.max_delay, Duration::from_secs(5));
    assert!((policy.jitter_fraction - 0.5).abs() < f64::EPSILON);
}

#[test]
fn backoff_doubles_from_base() {
    let policy = make_policy(10);
    assert_eq!(policy.backoff(1), Duration::from_millis(100));
    assert_eq!(policy.backoff(2), Duration::from_millis(200));
    assert_eq!(policy.backoff(3), Duration::from_millis(400));
    assert_eq!(policy.backoff(4), Duration::from_millis(800));
}

#[test]
fn backoff_caps_at_max_delay() {
    let policy = make_policy(10);
    // 100ms * 2^6 = 6.4s, past the 5s cap.
    assert_eq!(policy.backoff(7), Duration::from_secs(5));
    assert_eq!(policy.backoff(100), Duration::from_secs(5));
}

#[test]
fn backoff_survives_absurd_attempt_numbers() {
    let policy = make_policy(10);
    assert_eq!(policy.backoff(u32::MAX), Duration::from_secs(5));
}

#[test]
fn jitter_stays_inside_the_window() {
    let policy = RetryPolicy {
        jitter_fraction: 0.5,
        ..make_policy(3)
    };
    // Window is 50ms: half of the 100ms base delay.
    assert_eq!(policy.jitter_from(0), Duration::ZERO);
    assert_eq!(policy.jitter_from(49), Duration::from_millis(49));
    assert_eq!(policy.jitter_from(50), Duration::ZERO);
    assert!(policy.jitter_from(u64::MAX) < Duration::from_millis(50));
}

#[test]
fn zero_jitter_fraction_means_no_jitter() {
    let policy = make_policy(3);
    for random in [0, 1, 17, u64::MAX] {
        assert_eq!(policy.jitter_from(random), Duration::ZERO);
    }
}

#[test]
fn without_jitter_clears_the_fraction() {
    let policy = RetryPolicy::default().without_jitter();
    assert_eq!(policy.jitter_from(u64::MAX), Duration::ZERO);
}

#[test]
fn normalized_repairs_degenerate_policies() {
    let policy = RetryPolicy {
        max_attempts: 0,
        base_delay: Duration::from_secs(2),
        max_delay: Duration::from_millis(10),
        jitter_fraction: 7.5,
    }
    .normalized();

    assert_eq!(policy.max_attempts, 1);
    assert_eq!(policy.max_delay, Duration::from_secs(2));
    assert!((policy.jitter_fraction - 1.0).abs() < f64::EPSILON);

    let nan = RetryPolicy {
        jitter_fraction: f64::NAN,
        ..RetryPolicy::default()
    }
    .normalized();
    assert_eq!(nan.jitter_fraction, 0.0);
}

#[test]
fn policy_serialization_roundtrip() {
    let policy = make_policy(5);
    let json = serde_json::to_string(&policy).unwrap();
    let parsed: RetryPolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(policy, parsed);
}

// ── ConnectionGuard loop ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn first_attempt_success_uses_no_budget() {
    let mut guard = ConnectionGuard::new(make_policy(3));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();

    let result = guard
        .attempt(&mut log, &cancel, || async { Ok::<u64, StoreError>(7) })
        .await;

    assert_eq!(result, Ok(7));
    assert_eq!(log.len(), 1);
    assert!(log.last().unwrap().succeeded());
    assert_eq!(guard.state(), ConnectionState::Up);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_burn_budget_then_succeed() {
    let mut guard = ConnectionGuard::new(make_policy(3));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();

    let mut queue: VecDeque<StoreResult<u64>> =
        vec![Err(outage()), Err(outage()), Ok(7)].into();
    let result = guard
        .attempt(&mut log, &cancel, move || {
            let next = queue.pop_front().unwrap_or(Err(outage()));
            async move { next }
        })
        .await;

    assert_eq!(result, Ok(7));
    assert_eq!(log.len(), 3);
    assert!(matches!(
        log.records()[0].outcome,
        AttemptOutcome::TransientFailure(_)
    ));
    assert!(log.records()[2].succeeded());
    assert!(guard.is_up());
}

#[tokio::test(start_paused = true)]
async fn budget_exhaustion_interrupts() {
    let mut guard = ConnectionGuard::new(make_policy(3));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();

    let mut calls = 0u32;
    let result = guard
        .attempt(&mut log, &cancel, || {
            calls += 1;
            async { Err::<u64, _>(outage()) }
        })
        .await;

    assert_eq!(result, Err(GuardError::Interrupted));
    assert_eq!(calls, 3, "exactly max_attempts tries");
    assert_eq!(log.len(), 3);
    assert_eq!(guard.state(), ConnectionState::Down);
}

#[tokio::test(start_paused = true)]
async fn permanent_failure_stops_immediately() {
    let mut guard = ConnectionGuard::new(make_policy(5));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();

    let mut calls = 0u32;
    let result = guard
        .attempt(&mut log, &cancel, || {
            calls += 1;
            async { Err::<u64, _>(StoreError::conflict("version moved")) }
        })
        .await;

    assert_eq!(
        result,
        Err(GuardError::Permanent(StoreError::conflict("version moved")))
    );
    assert_eq!(calls, 1, "permanent failures must not be retried");
    assert_eq!(log.len(), 1);
    assert!(matches!(
        log.last().unwrap().outcome,
        AttemptOutcome::PermanentFailure(_)
    ));
    // The store answered, so the link itself counts as up.
    assert!(guard.is_up());
}

#[tokio::test(start_paused = true)]
async fn sleeps_follow_the_backoff_curve() {
    let mut guard = ConnectionGuard::new(make_policy(4));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();

    let started = tokio::time::Instant::now();
    let mut queue: VecDeque<StoreResult<u64>> =
        vec![Err(outage()), Err(outage()), Err(outage()), Ok(1)].into();
    let result = guard
        .attempt(&mut log, &cancel, move || {
            let next = queue.pop_front().unwrap_or(Err(outage()));
            async move { next }
        })
        .await;

    assert_eq!(result, Ok(1));
    // 100ms + 200ms + 400ms of backoff, nothing after the success.
    assert_eq!(started.elapsed(), Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn no_sleep_after_the_final_failure() {
    let mut guard = ConnectionGuard::new(make_policy(2));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();

    let started = tokio::time::Instant::now();
    let result = guard
        .attempt(&mut log, &cancel, || async { Err::<u64, _>(outage()) })
        .await;

    assert_eq!(result, Err(GuardError::Interrupted));
    assert_eq!(started.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_first_attempt_does_nothing() {
    let mut guard = ConnectionGuard::new(make_policy(3));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();
    cancel.cancel();

    let mut calls = 0u32;
    let result = guard
        .attempt(&mut log, &cancel, || {
            calls += 1;
            async { Ok::<u64, StoreError>(1) }
        })
        .await;

    assert_eq!(result, Err(GuardError::Cancelled));
    assert_eq!(calls, 0);
    assert!(log.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_is_observed_between_attempts() {
    let mut guard = ConnectionGuard::new(make_policy(5));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();

    // The flag goes up while the first attempt is in flight; the loop must
    // let that attempt resolve and record it before stopping.
    let handle = cancel.clone();
    let mut calls = 0u32;
    let result = guard
        .attempt(&mut log, &cancel, || {
            calls += 1;
            handle.cancel();
            async { Err::<u64, _>(outage()) }
        })
        .await;

    assert_eq!(result, Err(GuardError::Cancelled));
    assert_eq!(calls, 1);
    assert_eq!(log.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff_stops_the_next_attempt() {
    let mut guard = ConnectionGuard::new(make_policy(3));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();

    // The flag goes up in the middle of the 100ms backoff window; waking
    // from the sleep must not dispatch attempt 2.
    let handle = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    let started = tokio::time::Instant::now();
    let mut calls = 0u32;
    let result = guard
        .attempt(&mut log, &cancel, || {
            calls += 1;
            async { Err::<u64, _>(outage()) }
        })
        .await;

    assert_eq!(result, Err(GuardError::Cancelled));
    assert_eq!(calls, 1, "no new attempt once the flag is up");
    assert_eq!(log.len(), 1);
    assert_eq!(started.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn late_cancellation_does_not_steal_a_success() {
    let mut guard = ConnectionGuard::new(make_policy(3));
    let mut log = AttemptLog::new();
    let cancel = CancelHandle::new();

    let handle = cancel.clone();
    let result = guard
        .attempt(&mut log, &cancel, || {
            handle.cancel();
            async { Ok::<u64, StoreError>(42) }
        })
        .await;

    assert_eq!(result, Ok(42));
    assert!(log.last().unwrap().succeeded());
}

#[tokio::test(start_paused = true)]
async fn guard_normalizes_its_policy() {
    let guard = ConnectionGuard::new(RetryPolicy {
        max_attempts: 0,
        ..RetryPolicy::default()
    });
    assert_eq!(guard.policy().max_attempts, 1);
    assert!(guard.is_up());
}
