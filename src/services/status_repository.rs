//! Status records and the transaction-id index over one key-value store

use crate::cache::keys::versell::{StatusKey, TransactionMapKey};
use crate::cache::{CacheResult, KeyValueStore, KeyedTable};
use crate::payments::types::StatusRecord;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// State of the `idTransaction -> requestNumber` link for one transaction id.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingIntegrity {
    /// No mapping stored for the id
    Missing,
    /// Mapping present, but the record it points at is gone
    Dangling { request_number: String },
    /// Mapping present and its record exists
    Consistent { record: StatusRecord },
}

/// Both tables share one store and one retention window.
#[derive(Clone)]
pub struct StatusRepository {
    records: KeyedTable<StatusKey, StatusRecord>,
    mappings: KeyedTable<TransactionMapKey, String>,
}

impl StatusRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, retention: Duration) -> Self {
        Self {
            records: KeyedTable::new(store.clone(), retention),
            mappings: KeyedTable::new(store, retention),
        }
    }

    /// Overwrite the record under its request number.
    pub async fn save_record(&self, record: &StatusRecord) -> CacheResult<()> {
        debug!(
            request_number = %record.request_number,
            status = %record.status_transaction,
            "saving status record"
        );
        self.records
            .put(&StatusKey::new(record.request_number.as_str()), record)
            .await
    }

    pub async fn find_record(&self, request_number: &str) -> CacheResult<Option<StatusRecord>> {
        self.records.get(&StatusKey::new(request_number)).await
    }

    /// (Re)write the id link; the retention window restarts.
    pub async fn map_transaction(
        &self,
        id_transaction: &str,
        request_number: &str,
    ) -> CacheResult<()> {
        self.mappings
            .put(
                &TransactionMapKey::new(id_transaction),
                &request_number.to_string(),
            )
            .await
    }

    pub async fn resolve_request_number(&self, id_transaction: &str) -> CacheResult<Option<String>> {
        self.mappings
            .get(&TransactionMapKey::new(id_transaction))
            .await
    }

    /// Follow the id link and report whether it reaches a record.
    pub async fn mapping_integrity(&self, id_transaction: &str) -> CacheResult<MappingIntegrity> {
        let Some(request_number) = self.resolve_request_number(id_transaction).await? else {
            return Ok(MappingIntegrity::Missing);
        };

        Ok(match self.find_record(&request_number).await? {
            Some(record) => MappingIntegrity::Consistent { record },
            None => MappingIntegrity::Dangling { request_number },
        })
    }
}
