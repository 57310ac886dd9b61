//! PIX charge creation
//!
//! Validates the caller body, asks the provider for a charge and seeds the
//! status record plus the transaction-id link so later webhooks and polls can
//! find it.

use crate::error::{AppError, AppErrorKind, ValidationError};
use crate::logging::mask_document;
use crate::payments::amount::normalize_amount;
use crate::payments::types::{
    lenient_string, ChargeAddress, ChargeClient, ChargePayload, StatusRecord,
    DEFAULT_CLIENT_NAME, DEFAULT_PRODUCT_DESCRIPTION,
};
use crate::payments::PixGateway;
use crate::services::status_repository::StatusRepository;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{error, info};

/// Validated charge request, before the callback URL is attached
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub request_number: String,
    /// Major units, two decimals
    pub amount: Decimal,
    pub client: ChargeClient,
    pub products: Vec<JsonValue>,
}

impl ChargeRequest {
    pub fn from_json(body: &JsonValue) -> Result<Self, AppError> {
        if !body.is_object() {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidPayload {
                    field: None,
                    reason: "body must be a JSON object".to_string(),
                },
            )));
        }

        let request_number = body
            .get("requestNumber")
            .and_then(lenient_string)
            .ok_or_else(|| AppError::missing_field("requestNumber"))?;

        let amount = normalize_amount(body.get("amount").unwrap_or(&JsonValue::Null))?;

        let products = match body.get("products") {
            Some(JsonValue::Array(items)) if !items.is_empty() => items.clone(),
            _ => vec![json!({
                "description": DEFAULT_PRODUCT_DESCRIPTION,
                "quantity": 1,
                "value": amount.to_f64(),
            })],
        };

        Ok(Self {
            request_number,
            amount,
            client: charge_client(body.get("client")),
            products,
        })
    }

    pub fn into_payload(self, callback_url: Option<String>) -> ChargePayload {
        ChargePayload {
            request_number: self.request_number,
            amount: self.amount,
            callback_url,
            client: self.client,
            products: self.products,
        }
    }
}

fn charge_client(raw: Option<&JsonValue>) -> ChargeClient {
    let field = |name: &str| raw.and_then(|c| c.get(name)).and_then(lenient_string);

    let address = match raw.and_then(|c| c.get("address")) {
        Some(address @ JsonValue::Object(_)) => address.clone(),
        _ => json!(ChargeAddress::default()),
    };

    ChargeClient {
        name: field("name").unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
        document: field("document").unwrap_or_default(),
        phone_number: field("phoneNumber").unwrap_or_default(),
        email: field("email").unwrap_or_default(),
        address,
    }
}

/// What the landing page needs to render the charge
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResponse {
    pub id_transaction: Option<String>,
    pub payment_code: String,
    pub payment_code_base64: String,
    pub response: String,
    pub request_number: String,
}

pub struct PaymentInitiationService {
    gateway: Arc<dyn PixGateway>,
    repository: StatusRepository,
}

impl PaymentInitiationService {
    pub fn new(gateway: Arc<dyn PixGateway>, repository: StatusRepository) -> Self {
        Self {
            gateway,
            repository,
        }
    }

    /// Create the charge and seed its status.
    ///
    /// Credentials are checked before the body, and the body is fully
    /// validated before any provider call.
    pub async fn initiate(
        &self,
        body: &JsonValue,
        callback_url: Option<String>,
    ) -> Result<ChargeResponse, AppError> {
        self.gateway.ensure_configured()?;

        let request = ChargeRequest::from_json(body)?;
        let request_number = request.request_number.clone();
        let amount = request.amount;

        info!(
            request_number = %request_number,
            amount = %amount,
            document = %mask_document(&request.client.document),
            "initiating PIX charge"
        );

        let payload = request.into_payload(callback_url);
        let created = self.gateway.request_qrcode(&payload).await?;

        let record =
            StatusRecord::awaiting_approval(&request_number, created.id_transaction.clone(), amount);

        if let Err(e) = self.repository.save_record(&record).await {
            error!(
                request_number = %request_number,
                error = %e,
                "charge created but status record could not be stored"
            );
            return Err(AppError::from(e).with_context(format!(
                "charge {} created but not trackable",
                request_number
            )));
        }

        if let Some(id_transaction) = &created.id_transaction {
            if let Err(e) = self
                .repository
                .map_transaction(id_transaction, &request_number)
                .await
            {
                error!(
                    request_number = %request_number,
                    id_transaction = %id_transaction,
                    error = %e,
                    "charge created but transaction mapping could not be stored"
                );
                return Err(AppError::from(e).with_context(format!(
                    "charge {} created but not trackable",
                    request_number
                )));
            }
        }

        Ok(ChargeResponse {
            id_transaction: created.id_transaction,
            payment_code: created.payment_code.unwrap_or_default(),
            payment_code_base64: created.payment_code_base64.unwrap_or_default(),
            response: created.response.unwrap_or_else(|| "OK".to_string()),
            request_number,
        })
    }
}
