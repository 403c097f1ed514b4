//! Property-based tests for the rollback invariant.
//!
//! Whatever the operator types, a session that does not commit must leave
//! the stored record byte-for-byte as it was loaded. The edits here are
//! arbitrary: random field names, random values, random clears.

use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::Value;

use editflow_memstore::MemoryStore;
use editflow_model::{AcceptAll, ChangeSummary, FieldChange, Record, Snapshot};
use editflow_session::{EditSession, Outcome, Presenter, RetryPolicy, SessionError};

struct SilentPresenter;

#[async_trait]
impl Presenter for SilentPresenter {
    async fn show_form(&self, _snapshot: &Snapshot) {}
    async fn ask_confirmation(&self, _summary: &ChangeSummary) {}
    async fn show_success(&self, _record: &Record) {}
    async fn show_error(&self, _error: &SessionError) {}
    async fn show_cancelled(&self) {}
}

fn change_strategy() -> impl Strategy<Value = FieldChange> {
    let value = prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,10}".prop_map(Value::from),
        Just(Value::Null),
    ];
    ("[a-z]{1,6}", value).prop_map(|(field, value)| FieldChange { field, value })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn abandoned_edits_never_change_the_store(
        changes in prop::collection::vec(change_strategy(), 0..12),
        cancel_instead_of_decline in any::<bool>(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let id = store
                .insert(Record::new("prop").with_field("keep", "original"))
                .await;
            let before = store.get(id).await.unwrap();

            let mut session = EditSession::with_policy(
                Arc::clone(&store) as _,
                Arc::new(AcceptAll),
                Arc::new(SilentPresenter),
                RetryPolicy::default().without_jitter(),
            );
            session.start(id).await.unwrap();
            session.apply(&changes).unwrap();

            if cancel_instead_of_decline {
                session.cancel().await.unwrap();
            } else {
                session.submit().await.unwrap();
                let outcome = session.confirm(false).await.unwrap();
                assert_eq!(outcome, Outcome::RolledBack);
            }

            assert_eq!(store.get(id).await.unwrap(), before);
        });
    }
}
