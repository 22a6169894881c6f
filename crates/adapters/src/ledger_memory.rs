//! In-memory publication ledger for testing and throwaway runs

use async_trait::async_trait;
use phrasecast_domain::{LedgerError, PublicationLedger, PublishedRecord};
use std::sync::RwLock;

/// In-memory ledger implementation, one record per artifact name
pub struct InMemoryLedger {
    records: RwLock<Vec<PublishedRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PublicationLedger for InMemoryLedger {
    async fn is_published(&self, artifact_name: &str) -> Result<bool, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(records.iter().any(|r| r.artifact_name == artifact_name))
    }

    async fn record_published(&self, record: &PublishedRecord) -> Result<(), LedgerError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        records.retain(|r| r.artifact_name != record.artifact_name);
        records.push(record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PublishedRecord>, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(records.clone())
    }

    async fn reset(&self) -> Result<u64, LedgerError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let removed = records.len() as u64;
        records.clear();
        Ok(removed)
    }
}
