//! Scripted fault injection.

use std::collections::VecDeque;
use std::sync::Mutex;

use editflow_model::{RecordId, StoreError};

/// A failure the store should fake on one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Transient outage; the call fails with `StoreError::Unavailable`.
    Unavailable,
    /// The call fails with `StoreError::Conflict`.
    Conflict,
    /// The call fails with `StoreError::NotFound`.
    NotFound,
}

impl Fault {
    pub(crate) fn into_error(self, id: RecordId) -> StoreError {
        match self {
            Self::Unavailable => StoreError::unavailable("scripted outage"),
            Self::Conflict => StoreError::conflict("scripted conflict"),
            Self::NotFound => StoreError::NotFound(id),
        }
    }
}

/// A queue of failures consumed one per store call, front first.
///
/// Once the queue drains, calls behave normally again — "fail twice then
/// recover" is `unavailable_times(2)`. Scripts are cheap interior-mutability
/// queues so a shared store reference can be scripted mid-test.
#[derive(Debug, Default)]
pub struct FaultScript {
    queue: Mutex<VecDeque<Fault>>,
}

impl FaultScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one fault to the script.
    pub fn push(&self, fault: Fault) {
        self.lock().push_back(fault);
    }

    /// Appends `n` transient outages.
    pub fn unavailable_times(&self, n: usize) {
        let mut queue = self.lock();
        for _ in 0..n {
            queue.push_back(Fault::Unavailable);
        }
    }

    /// Pops the next scripted fault, if any.
    pub(crate) fn take(&self) -> Option<Fault> {
        self.lock().pop_front()
    }

    /// Number of faults still scheduled.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Fault>> {
        // A panic while holding this lock can only come from the test
        // itself; inheriting the poisoned queue is fine there.
        match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
