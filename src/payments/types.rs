use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

pub const STATUS_WAITING_FOR_APPROVAL: &str = "WAITING_FOR_APPROVAL";
pub const STATUS_UNKNOWN: &str = "UNKNOWN";
pub const TYPE_PIX: &str = "PIX";

pub const DEFAULT_CLIENT_NAME: &str = "Cliente";
pub const DEFAULT_PRODUCT_DESCRIPTION: &str = "Pagamento";

/// Provider field names that may carry the transaction status, in priority order.
pub const STATUS_FIELDS: [&str; 3] = ["statusTransaction", "status", "processingStatus"];

/// Read `value` as a trimmed, non-empty string; numbers are stringified.
pub fn lenient_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First of `fields` on `object` that holds a usable string.
pub fn first_string_field(object: &JsonValue, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| object.get(*field).and_then(lenient_string))
}

fn de_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(lenient_string))
}

/// Postal address sent with the charge; empty strings when the caller has none.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChargeAddress {
    pub cod_ibge: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub zip_code: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChargeClient {
    pub name: String,
    pub document: String,
    pub phone_number: String,
    pub email: String,
    /// Caller-supplied address object passed through as-is
    pub address: JsonValue,
}

/// Body of the provider's `request-qrcode` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChargePayload {
    pub request_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub client: ChargeClient,
    pub products: Vec<JsonValue>,
}

/// Provider answer to `request-qrcode`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub id_transaction: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub payment_code: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub payment_code_base64: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub response: Option<String>,
}

/// Body of the provider's `walletTransaction` lookup; only set keys are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransactionQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_transaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_to_end: Option<String>,
}

impl WalletTransactionQuery {
    /// Build from a caller body, ignoring blank identifiers.
    pub fn from_json(body: &JsonValue) -> Self {
        Self {
            request_number: body.get("requestNumber").and_then(lenient_string),
            id_transaction: body.get("idTransaction").and_then(lenient_string),
            end_to_end: body.get("endToEnd").and_then(lenient_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.request_number.is_none() && self.id_transaction.is_none() && self.end_to_end.is_none()
    }
}

/// Provider answer to `walletTransaction`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WalletTransactionResponse {
    #[serde(default)]
    pub transaction: Option<JsonValue>,
}

/// Last known state of one payment attempt, stored under its request number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub request_number: String,
    pub id_transaction: Option<String>,
    pub status_transaction: String,
    pub type_transaction: Option<String>,
    /// Major currency units
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debtor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debtor_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_to_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Original webhook payload, kept for audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<JsonValue>,
    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    /// Record seeded right after the provider created the charge.
    pub fn awaiting_approval(
        request_number: impl Into<String>,
        id_transaction: Option<String>,
        value: Decimal,
    ) -> Self {
        Self {
            request_number: request_number.into(),
            id_transaction,
            status_transaction: STATUS_WAITING_FOR_APPROVAL.to_string(),
            type_transaction: Some(TYPE_PIX.to_string()),
            value: Some(value),
            debtor_name: None,
            debtor_document: None,
            end_to_end: None,
            date: None,
            message: None,
            raw: None,
            updated_at: Utc::now(),
        }
    }

    /// Synthetic answer for a request number with nothing stored yet.
    pub fn placeholder(request_number: impl Into<String>) -> Self {
        Self {
            value: None,
            ..Self::awaiting_approval(request_number, None, Decimal::ZERO)
        }
    }

    /// Snapshot of a webhook event. Every field comes from the event, so
    /// writing it replaces whatever an earlier source stored.
    pub fn from_webhook(request_number: impl Into<String>, payload: &JsonValue) -> Self {
        Self {
            request_number: request_number.into(),
            id_transaction: payload.get("idTransaction").and_then(lenient_string),
            status_transaction: first_string_field(payload, &STATUS_FIELDS)
                .unwrap_or_else(|| STATUS_UNKNOWN.to_string()),
            type_transaction: payload.get("typeTransaction").and_then(lenient_string),
            value: payload.get("value").and_then(decimal_from_json),
            debtor_name: payload.get("debtorName").and_then(lenient_string),
            debtor_document: payload.get("debtorDocument").and_then(lenient_string),
            end_to_end: payload.get("endToEnd").and_then(lenient_string),
            date: payload.get("date").and_then(lenient_string),
            message: payload.get("message").and_then(lenient_string),
            raw: Some(payload.clone()),
            updated_at: Utc::now(),
        }
    }
}

/// Parse a JSON number or numeric string as a decimal, as given (no unit conversion).
pub fn decimal_from_json(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => parse_decimal(&n.to_string()),
        JsonValue::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

/// Plain or scientific decimal notation. `NaN` and infinities are rejected.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    use std::str::FromStr;

    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
