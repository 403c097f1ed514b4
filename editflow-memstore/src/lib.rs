//! In-memory [`RecordStore`] with scripted fault injection.
//!
//! Backs tests, examples and offline tooling. Records live in a
//! `HashMap` behind an async `RwLock`; persistence follows the same
//! optimistic-concurrency contract a remote store would:
//!
//! - drafts based on the stored version win and bump it by one
//! - replaying a write that already landed reports success without
//!   touching anything, so retrying after a lost acknowledgement is safe
//! - anything else is a conflict
//!
//! [`FaultScript`]s let a test fail the next N calls — "two outages, then
//! recover" — without touching the store's data.

mod fault;

pub use fault::{Fault, FaultScript};

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use editflow_model::{Record, RecordId, Snapshot, StoreError, StoreResult};
use editflow_session::RecordStore;

/// Thread-safe in-memory record store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<RecordId, Record>>,
    load_faults: FaultScript,
    persist_faults: FaultScript,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record directly, bypassing the persistence contract.
    ///
    /// Records arriving with version 0 are stored at version 1, as if they
    /// had been persisted once. Returns the record's id.
    pub async fn insert(&self, mut record: Record) -> RecordId {
        if record.version == 0 {
            record.version = 1;
        }
        let id = record.id;
        self.records.write().await.insert(id, record);
        id
    }

    /// Removes a record, simulating an out-of-band delete.
    pub async fn remove(&self, id: RecordId) -> Option<Record> {
        self.records.write().await.remove(&id)
    }

    /// A copy of the stored record, for assertions.
    pub async fn get(&self, id: RecordId) -> Option<Record> {
        self.records.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Faults consumed by `load` calls, front first.
    pub fn load_faults(&self) -> &FaultScript {
        &self.load_faults
    }

    /// Faults consumed by `persist` calls, front first.
    pub fn persist_faults(&self) -> &FaultScript {
        &self.persist_faults
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self, id: RecordId) -> StoreResult<Snapshot> {
        if let Some(fault) = self.load_faults.take() {
            debug!("Injecting {fault:?} into load of {id}");
            return Err(fault.into_error(id));
        }
        let records = self.records.read().await;
        records
            .get(&id)
            .cloned()
            .map(Snapshot::new)
            .ok_or(StoreError::NotFound(id))
    }

    async fn persist(&self, record: &Record) -> StoreResult<u64> {
        if let Some(fault) = self.persist_faults.take() {
            debug!("Injecting {fault:?} into persist of {}", record.id);
            return Err(fault.into_error(record.id));
        }
        let mut records = self.records.write().await;
        match records.get(&record.id) {
            // First write under a fresh id creates the record.
            None => {
                let version = record.version + 1;
                let mut stored = record.clone();
                stored.version = version;
                records.insert(record.id, stored);
                debug!("Created {} at version {version}", record.id);
                Ok(version)
            }
            Some(stored) if stored.version == record.version => {
                let version = record.version + 1;
                let mut next = record.clone();
                next.version = version;
                records.insert(record.id, next);
                debug!("Updated {} to version {version}", record.id);
                Ok(version)
            }
            // A replay of a write that already landed: same payload, one
            // version behind. Answer as the original success would have.
            Some(stored)
                if stored.version == record.version + 1
                    && stored.fields == record.fields
                    && stored.record_type == record.record_type =>
            {
                debug!("Replayed persist of {} at version {}", record.id, stored.version);
                Ok(stored.version)
            }
            Some(stored) => Err(StoreError::conflict(format!(
                "record {} is at version {}, draft was based on {}",
                record.id, stored.version, record.version
            ))),
        }
    }

    async fn list_ids(&self) -> StoreResult<Vec<RecordId>> {
        let records = self.records.read().await;
        let mut ids: Vec<RecordId> = records.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}
