use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use crate::payments::types::{lenient_string, StatusRecord};
use crate::services::status_repository::StatusRepository;

/// How one delivery was handled. Every variant is acknowledged to the
/// provider with a 200.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Applied { request_number: String },
    /// Neither a request number nor a known transaction id; nothing stored
    Unresolved,
    /// A store read or write failed; the event may be lost
    StoreFailed { reason: String },
}

pub struct WebhookProcessor {
    repository: StatusRepository,
}

impl WebhookProcessor {
    pub fn new(repository: StatusRepository) -> Self {
        Self { repository }
    }

    /// Apply one delivery. A payload that is not an object carries no
    /// identifiers and ends up [`WebhookOutcome::Unresolved`].
    pub async fn process_webhook(&self, payload: &JsonValue) -> WebhookOutcome {
        let id_transaction = payload.get("idTransaction").and_then(lenient_string);

        let request_number = match payload.get("requestNumber").and_then(lenient_string) {
            Some(request_number) => Some(request_number),
            None => match &id_transaction {
                Some(id) => match self.repository.resolve_request_number(id).await {
                    Ok(found) => found,
                    Err(e) => return store_failed(e),
                },
                None => None,
            },
        };

        let Some(request_number) = request_number else {
            warn!(
                id_transaction = ?id_transaction,
                "webhook without a resolvable requestNumber, ignoring"
            );
            return WebhookOutcome::Unresolved;
        };

        let record = StatusRecord::from_webhook(&request_number, payload);

        if let Err(e) = self.repository.save_record(&record).await {
            return store_failed(e);
        }

        if let Some(id) = &id_transaction {
            if let Err(e) = self.repository.map_transaction(id, &request_number).await {
                return store_failed(e);
            }
        }

        info!(
            request_number = %request_number,
            id_transaction = ?id_transaction,
            status = %record.status_transaction,
            "Webhook applied"
        );

        WebhookOutcome::Applied { request_number }
    }
}

fn store_failed(err: impl std::fmt::Display) -> WebhookOutcome {
    error!(error = %err, "Webhook store operation failed");
    WebhookOutcome::StoreFailed {
        reason: err.to_string(),
    }
}
