//! Status reads: the two store readers and the provider poll-through

use crate::error::{AppError, AppErrorKind, ValidationError};
use crate::payments::types::{
    first_string_field, lenient_string, StatusRecord, WalletTransactionQuery, STATUS_UNKNOWN,
};
use crate::payments::PixGateway;
use crate::services::status_repository::{MappingIntegrity, StatusRepository};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, warn};

/// Answer of the poll-through endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolledStatus {
    pub ok: bool,
    pub status: String,
    pub id_transaction: Option<String>,
    pub request_number: Option<String>,
    pub end_to_end: Option<String>,
    pub raw: Option<JsonValue>,
}

impl PolledStatus {
    fn from_transaction(transaction: Option<JsonValue>, query: &WalletTransactionQuery) -> Self {
        let tx = transaction.as_ref();
        let field = |name: &str| tx.and_then(|t| t.get(name)).and_then(lenient_string);

        let status = tx
            .and_then(|t| first_string_field(t, &["processingStatus", "statusTransaction"]))
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| STATUS_UNKNOWN.to_string());

        Self {
            ok: true,
            status,
            id_transaction: field("idTransaction").or_else(|| query.id_transaction.clone()),
            request_number: field("requestNumber").or_else(|| query.request_number.clone()),
            end_to_end: field("endToEnd"),
            raw: transaction,
        }
    }
}

pub struct StatusQueryService {
    gateway: Arc<dyn PixGateway>,
    repository: StatusRepository,
}

impl StatusQueryService {
    pub fn new(gateway: Arc<dyn PixGateway>, repository: StatusRepository) -> Self {
        Self {
            gateway,
            repository,
        }
    }

    /// Stored record, or a synthetic "awaiting approval" answer. Never not-found.
    pub async fn cached_status(&self, request_number: Option<&str>) -> Result<StatusRecord, AppError> {
        let request_number = non_blank(request_number)
            .ok_or_else(|| AppError::missing_field("requestNumber"))?;

        let record = self.repository.find_record(request_number).await?;
        if record.is_none() {
            debug!(request_number = %request_number, "no stored status, answering default");
        }
        Ok(record.unwrap_or_else(|| StatusRecord::placeholder(request_number)))
    }

    /// Record by transaction id (through the mapping only) or by request number.
    ///
    /// When `id` is given `request_number` is ignored, so a missing mapping is
    /// not-found even if a record exists under some request number.
    pub async fn transaction(
        &self,
        id: Option<&str>,
        request_number: Option<&str>,
    ) -> Result<StatusRecord, AppError> {
        if let Some(id) = non_blank(id) {
            return match self.repository.mapping_integrity(id).await? {
                MappingIntegrity::Consistent { record } => Ok(record),
                MappingIntegrity::Missing => Err(AppError::not_found(id)),
                MappingIntegrity::Dangling { request_number } => {
                    warn!(
                        id_transaction = %id,
                        request_number = %request_number,
                        "transaction mapping points at a missing record"
                    );
                    Err(AppError::not_found(id))
                }
            };
        }

        let request_number = non_blank(request_number).ok_or_else(|| {
            AppError::new(AppErrorKind::Validation(ValidationError::InvalidPayload {
                field: Some("id".to_string()),
                reason: "Provide id or r".to_string(),
            }))
        })?;

        self.repository
            .find_record(request_number)
            .await?
            .ok_or_else(|| AppError::not_found(request_number))
    }

    /// Ask the provider directly. Nothing is written back to the store.
    pub async fn poll_provider(&self, body: &JsonValue) -> Result<PolledStatus, AppError> {
        self.gateway.ensure_configured()?;

        let query = WalletTransactionQuery::from_json(body);
        if query.is_empty() {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidPayload {
                    field: None,
                    reason: "Provide requestNumber, idTransaction or endToEnd".to_string(),
                },
            )));
        }

        let response = self.gateway.wallet_transaction(&query).await?;
        Ok(PolledStatus::from_transaction(response.transaction, &query))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
