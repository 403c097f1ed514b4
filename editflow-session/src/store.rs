//! Record store capability.

use async_trait::async_trait;

use editflow_model::{Record, RecordId, Snapshot, StoreResult};

/// Abstract store for remote-backed records.
///
/// Implementations own failure classification: every error they return is
/// either transient (`StoreError::Unavailable`, eligible for retry) or
/// permanent (`NotFound` / `Conflict`, surfaced immediately). A timeout on a
/// single call is the implementation's to detect and must come back as
/// `Unavailable`.
///
/// `persist` may be re-invoked with the same draft after a failure whose
/// remote outcome is unknown — a timeout can fire after the write already
/// landed. Implementations must therefore be idempotent per record id:
/// replaying an identical draft leaves the stored record exactly as a single
/// persist would have, and reports success.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Loads the current state of a record as an immutable snapshot.
    async fn load(&self, id: RecordId) -> StoreResult<Snapshot>;

    /// Writes a draft. Returns the version the store assigned to it.
    async fn persist(&self, record: &Record) -> StoreResult<u64>;

    /// Ids this store can serve, for pickers and admin tooling. Stores
    /// without enumeration keep the default empty answer.
    async fn list_ids(&self) -> StoreResult<Vec<RecordId>> {
        Ok(Vec::new())
    }
}
