//! Selection of the next artifact to publish

use crate::model::ArtifactRef;
use crate::ports::{ArtifactStore, LedgerError, PublicationLedger, StoreError};

/// Errors from artifact selection
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("No pending artifacts to publish")]
    NoPendingArtifacts,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Picks the first unpublished artifact in store order
pub struct PublicationSelector<'a, A, L>
where
    A: ArtifactStore + ?Sized,
    L: PublicationLedger + ?Sized,
{
    store: &'a A,
    ledger: &'a L,
}

impl<'a, A, L> PublicationSelector<'a, A, L>
where
    A: ArtifactStore + ?Sized,
    L: PublicationLedger + ?Sized,
{
    pub fn new(store: &'a A, ledger: &'a L) -> Self {
        Self { store, ledger }
    }

    /// The next artifact to publish, or `NoPendingArtifacts` once every
    /// listed artifact is in the ledger.
    pub async fn next_artifact(&self) -> Result<ArtifactRef, SelectError> {
        for artifact in self.store.list_all().await? {
            if !self.ledger.is_published(&artifact.name).await? {
                return Ok(artifact);
            }
        }
        Err(SelectError::NoPendingArtifacts)
    }

    /// Listed artifacts split into (published, pending)
    pub async fn partition(&self) -> Result<(Vec<ArtifactRef>, Vec<ArtifactRef>), SelectError> {
        let mut published = Vec::new();
        let mut pending = Vec::new();
        for artifact in self.store.list_all().await? {
            if self.ledger.is_published(&artifact.name).await? {
                published.push(artifact);
            } else {
                pending.push(artifact);
            }
        }
        Ok((published, pending))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::PublishedRecord;
    use crate::usecases::generate::tests::FakeStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[derive(Default)]
    pub(crate) struct FakeLedger {
        pub records: Mutex<Vec<PublishedRecord>>,
    }

    impl FakeLedger {
        pub(crate) fn mark(&self, name: &str) {
            self.records.lock().unwrap().push(PublishedRecord {
                id: Uuid::new_v4(),
                artifact_name: name.to_string(),
                sequence_index: None,
                content_hash: String::new(),
                remote_id: "remote".to_string(),
                remote_url: None,
                caption: String::new(),
                published_at: OffsetDateTime::UNIX_EPOCH,
            });
        }

        pub(crate) fn names(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.artifact_name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl PublicationLedger for FakeLedger {
        async fn is_published(&self, artifact_name: &str) -> Result<bool, LedgerError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .any(|r| r.artifact_name == artifact_name))
        }

        async fn record_published(&self, record: &PublishedRecord) -> Result<(), LedgerError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn list(&self) -> Result<Vec<PublishedRecord>, LedgerError> {
            Ok(self.records.lock().unwrap().clone())
        }

        async fn reset(&self) -> Result<u64, LedgerError> {
            let mut records = self.records.lock().unwrap();
            let count = records.len() as u64;
            records.clear();
            Ok(count)
        }
    }

    #[tokio::test]
    async fn test_selects_first_in_numeric_order() {
        let store = FakeStore::with_names(&["10_B.jpg", "2_A.jpg"]);
        let ledger = FakeLedger::default();

        let next = PublicationSelector::new(&store, &ledger)
            .next_artifact()
            .await
            .unwrap();

        assert_eq!(next.name, "2_A.jpg");
    }

    #[tokio::test]
    async fn test_skips_published_artifacts() {
        let store = FakeStore::with_names(&["1_A.jpg", "2_B.jpg", "3_C.jpg"]);
        let ledger = FakeLedger::default();
        ledger.mark("1_A.jpg");
        ledger.mark("3_C.jpg");

        let selector = PublicationSelector::new(&store, &ledger);
        assert_eq!(selector.next_artifact().await.unwrap().name, "2_B.jpg");

        let (published, pending) = selector.partition().await.unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_store_reports_no_pending() {
        let store = FakeStore::with_names(&["1_A.jpg"]);
        let ledger = FakeLedger::default();
        ledger.mark("1_A.jpg");

        let result = PublicationSelector::new(&store, &ledger)
            .next_artifact()
            .await;

        assert!(matches!(result, Err(SelectError::NoPendingArtifacts)));
    }

    #[tokio::test]
    async fn test_empty_store_reports_no_pending() {
        let store = FakeStore::default();
        let ledger = FakeLedger::default();

        let result = PublicationSelector::new(&store, &ledger)
            .next_artifact()
            .await;

        assert!(matches!(result, Err(SelectError::NoPendingArtifacts)));
    }
}
