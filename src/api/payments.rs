use axum::{extract::State, http::HeaderMap, Json};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::api::{AppState, WEBHOOK_PATH};
use crate::error::AppError;
use crate::middleware::error::with_request_id;
use crate::services::ChargeResponse;

/// POST /api/versell-qrcode
pub async fn create_qrcode(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ChargeResponse>, AppError> {
    // Unparseable bodies are validated (and rejected) after the credential check.
    let payload: JsonValue = serde_json::from_str(&body).unwrap_or(JsonValue::Null);
    let callback_url = callback_url(state.public_base_url.as_deref(), &headers);

    let response = state
        .initiation
        .initiate(&payload, callback_url)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    info!(
        request_number = %response.request_number,
        id_transaction = ?response.id_transaction,
        "PIX charge returned to caller"
    );

    Ok(Json(response))
}

/// Webhook URL handed to the provider.
///
/// `PUBLIC_BASE_URL` wins; otherwise the origin is rebuilt from the proxy
/// headers. `None` when no host is known.
pub fn callback_url(public_base_url: Option<&str>, headers: &HeaderMap) -> Option<String> {
    if let Some(base) = public_base_url {
        return Some(format!("{}{}", base.trim_end_matches('/'), WEBHOOK_PATH));
    }

    let proto =
        first_header_value(headers, "x-forwarded-proto").unwrap_or_else(|| "https".to_string());
    let host = first_header_value(headers, "x-forwarded-host")
        .or_else(|| first_header_value(headers, "host"))?;

    Some(format!("{}://{}{}", proto, host, WEBHOOK_PATH))
}

fn first_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
